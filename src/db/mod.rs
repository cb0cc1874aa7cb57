use crate::config::SecurityConfig;
use crate::domain::comment_tree::FlatComment;
use crate::domain::reset::{ResetState, ResetTicket};
use crate::domain::{CommentId, RecipeId, UserId};
use crate::models::recipe::{Ingredient, IngredientRename, NewRecipe, Recipe};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::comment::CommentRow;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id.value()).await
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(name, email, password, config).await
    }

    pub async fn admin_count(&self) -> Result<u64> {
        self.user_repo().admin_count().await
    }

    pub async fn set_user_admin(&self, id: UserId, is_admin: bool) -> Result<bool> {
        self.user_repo().set_admin(id.value(), is_admin).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn set_reset_ticket(&self, id: UserId, ticket: &ResetTicket) -> Result<bool> {
        self.user_repo().set_reset_ticket(id.value(), ticket).await
    }

    pub async fn find_user_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<(User, ResetState)>> {
        self.user_repo().find_by_reset_token(token).await
    }

    pub async fn get_reset_state(&self, id: UserId) -> Result<Option<ResetState>> {
        self.user_repo().get_reset_state(id.value()).await
    }

    pub async fn consume_reset_token(
        &self,
        token: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        self.user_repo()
            .consume_reset_token(token, new_password, config)
            .await
    }

    pub async fn clear_reset_token(&self, token: &str) -> Result<bool> {
        self.user_repo().clear_reset_token(token).await
    }

    // ========================================================================
    // Recipes
    // ========================================================================

    pub async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        self.recipe_repo().list_all().await
    }

    pub async fn search_recipes(&self, fragment: &str) -> Result<Vec<Recipe>> {
        self.recipe_repo().search_by_name(fragment).await
    }

    pub async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    pub async fn latest_recipe(&self) -> Result<Option<Recipe>> {
        self.recipe_repo().latest().await
    }

    pub async fn add_recipe(&self, recipe: &NewRecipe) -> Result<Recipe> {
        self.recipe_repo().add(recipe).await
    }

    pub async fn update_recipe(
        &self,
        id: RecipeId,
        name: &str,
        description: &str,
        renames: &[IngredientRename],
    ) -> Result<bool> {
        self.recipe_repo()
            .update(id, name, description, renames)
            .await
    }

    pub async fn remove_recipe(&self, id: RecipeId) -> Result<bool> {
        self.recipe_repo().remove(id).await
    }

    pub async fn get_ingredients(&self, recipe_id: RecipeId) -> Result<Vec<Ingredient>> {
        self.recipe_repo().ingredients_for(recipe_id).await
    }

    pub async fn add_ingredient(&self, recipe_id: RecipeId, name: &str) -> Result<Ingredient> {
        self.recipe_repo().add_ingredient(recipe_id, name).await
    }

    // ========================================================================
    // Comments
    // ========================================================================

    pub async fn add_comment(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
        parent_id: Option<CommentId>,
        body: &str,
    ) -> Result<CommentId> {
        self.comment_repo()
            .add(recipe_id, user_id, parent_id, body)
            .await
    }

    pub async fn get_comment(&self, id: CommentId) -> Result<Option<CommentRow>> {
        self.comment_repo().get(id).await
    }

    pub async fn list_comments(&self, recipe_id: RecipeId) -> Result<Vec<FlatComment>> {
        self.comment_repo().list_for_recipe(recipe_id).await
    }

    pub async fn delete_comments_for_recipe(&self, recipe_id: RecipeId) -> Result<u64> {
        self.comment_repo().delete_for_recipe(recipe_id).await
    }
}
