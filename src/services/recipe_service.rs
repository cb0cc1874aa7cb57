//! Domain service for recipes and their ingredients.

use serde::Serialize;
use thiserror::Error;

use crate::domain::comment_tree::CommentNode;
use crate::domain::{RecipeId, SessionContext};
use crate::models::recipe::{Ingredient, Recipe, RecipeDraft, RecipeUpdate};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe not found: {0}")]
    NotFound(RecipeId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Login required")]
    Unauthorized,

    #[error("Administrator rights required")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Only administrators may change recipe content.
pub fn require_admin(ctx: &SessionContext) -> Result<(), RecipeError> {
    if !ctx.is_authenticated() {
        return Err(RecipeError::Unauthorized);
    }
    if !ctx.is_admin() {
        return Err(RecipeError::Forbidden);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeList {
    pub recipes: Vec<Recipe>,
    pub count: usize,
}

impl From<Vec<Recipe>> for RecipeList {
    fn from(recipes: Vec<Recipe>) -> Self {
        Self {
            count: recipes.len(),
            recipes,
        }
    }
}

/// Everything the recipe page shows.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub comments: Vec<CommentNode>,
    pub comment_count: usize,
    pub is_authenticated: bool,
    pub is_admin: bool,
}

#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    async fn list(&self) -> Result<RecipeList, RecipeError>;

    /// Substring match on the name. An empty fragment lists everything.
    async fn search(&self, name: Option<&str>) -> Result<RecipeList, RecipeError>;

    async fn detail(&self, ctx: &SessionContext, id: RecipeId)
    -> Result<RecipeDetail, RecipeError>;

    /// Stores the image (if any) after the form validated.
    async fn create(&self, ctx: &SessionContext, draft: RecipeDraft)
    -> Result<Recipe, RecipeError>;

    async fn add_ingredient(
        &self,
        ctx: &SessionContext,
        id: RecipeId,
        name: &str,
    ) -> Result<Ingredient, RecipeError>;

    async fn update(
        &self,
        ctx: &SessionContext,
        id: RecipeId,
        update: RecipeUpdate,
    ) -> Result<RecipeDetail, RecipeError>;

    async fn delete(&self, ctx: &SessionContext, id: RecipeId) -> Result<(), RecipeError>;

    /// Most recently created recipe, for the admin dashboard.
    async fn latest(&self, ctx: &SessionContext) -> Result<Option<Recipe>, RecipeError>;
}
