//! `SeaORM` implementation of the `RecipeService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::constants::limits::MAX_RECIPE_NAME_LEN;
use crate::db::Store;
use crate::domain::comment_tree::{build_comment_tree, count_nodes};
use crate::domain::{RecipeId, SessionContext};
use crate::models::recipe::{Ingredient, NewRecipe, Recipe, RecipeDraft, RecipeUpdate};
use crate::services::image::ImageService;
use crate::services::recipe_service::{
    RecipeDetail, RecipeError, RecipeList, RecipeService, require_admin,
};

pub struct SeaOrmRecipeService {
    store: Store,
    images: Arc<ImageService>,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    async fn load_detail(
        &self,
        ctx: &SessionContext,
        id: RecipeId,
    ) -> Result<RecipeDetail, RecipeError> {
        let recipe = self
            .store
            .get_recipe(id)
            .await?
            .ok_or(RecipeError::NotFound(id))?;

        let ingredients = self.store.get_ingredients(id).await?;
        let comments = build_comment_tree(self.store.list_comments(id).await?);

        Ok(RecipeDetail {
            recipe,
            ingredients,
            comment_count: count_nodes(&comments),
            comments,
            is_authenticated: ctx.is_authenticated(),
            is_admin: ctx.is_admin(),
        })
    }
}

fn validate_name(name: &str) -> Result<&str, RecipeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RecipeError::Validation("Recipe name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(RecipeError::Validation(format!(
            "Recipe name must be {MAX_RECIPE_NAME_LEN} characters or less"
        )));
    }
    Ok(name)
}

fn validate_description(description: &str) -> Result<&str, RecipeError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(RecipeError::Validation("Description cannot be empty".to_string()));
    }
    Ok(description)
}

fn validate_ingredient(name: &str) -> Result<&str, RecipeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RecipeError::Validation("Ingredient cannot be empty".to_string()));
    }
    Ok(name)
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(&self) -> Result<RecipeList, RecipeError> {
        Ok(self.store.list_recipes().await?.into())
    }

    async fn search(&self, name: Option<&str>) -> Result<RecipeList, RecipeError> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(fragment) => Ok(self.store.search_recipes(fragment).await?.into()),
            None => self.list().await,
        }
    }

    async fn detail(
        &self,
        ctx: &SessionContext,
        id: RecipeId,
    ) -> Result<RecipeDetail, RecipeError> {
        self.load_detail(ctx, id).await
    }

    async fn create(
        &self,
        ctx: &SessionContext,
        draft: RecipeDraft,
    ) -> Result<Recipe, RecipeError> {
        require_admin(ctx)?;

        let name = validate_name(&draft.name)?.to_string();
        let description = validate_description(&draft.description)?.to_string();
        let duration = draft
            .duration
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let image_path = match draft.image.filter(|img| !img.bytes.is_empty()) {
            Some(image) => Some(self.images.save_upload(&image.filename, &image.bytes).await?),
            None => None,
        };

        let recipe = self
            .store
            .add_recipe(&NewRecipe {
                name,
                description,
                duration,
                image_path,
            })
            .await?;

        info!(recipe_id = %recipe.id, "Created recipe");
        Ok(recipe)
    }

    async fn add_ingredient(
        &self,
        ctx: &SessionContext,
        id: RecipeId,
        name: &str,
    ) -> Result<Ingredient, RecipeError> {
        require_admin(ctx)?;
        let name = validate_ingredient(name)?;

        if self.store.get_recipe(id).await?.is_none() {
            return Err(RecipeError::NotFound(id));
        }

        Ok(self.store.add_ingredient(id, name).await?)
    }

    async fn update(
        &self,
        ctx: &SessionContext,
        id: RecipeId,
        mut update: RecipeUpdate,
    ) -> Result<RecipeDetail, RecipeError> {
        require_admin(ctx)?;

        let name = validate_name(&update.name)?.to_string();
        let description = validate_description(&update.description)?.to_string();
        for rename in &mut update.ingredients {
            rename.name = validate_ingredient(&rename.name)?.to_string();
        }

        if !self
            .store
            .update_recipe(id, &name, &description, &update.ingredients)
            .await?
        {
            return Err(RecipeError::NotFound(id));
        }

        info!(recipe_id = %id, "Updated recipe");
        self.load_detail(ctx, id).await
    }

    async fn delete(&self, ctx: &SessionContext, id: RecipeId) -> Result<(), RecipeError> {
        require_admin(ctx)?;

        if !self.store.remove_recipe(id).await? {
            return Err(RecipeError::NotFound(id));
        }
        Ok(())
    }

    async fn latest(&self, ctx: &SessionContext) -> Result<Option<Recipe>, RecipeError> {
        require_admin(ctx)?;
        Ok(self.store.latest_recipe().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_store;
    use crate::domain::{SessionUser, UserId};
    use crate::models::recipe::{ImageUpload, IngredientRename};

    fn admin() -> SessionContext {
        SessionContext::authenticated(SessionUser {
            id: UserId::new(1),
            name: "Chef".to_string(),
            email: "chef@x.com".to_string(),
            is_admin: true,
        })
    }

    fn guest() -> SessionContext {
        SessionContext::authenticated(SessionUser {
            id: UserId::new(2),
            name: "Guest".to_string(),
            email: "guest@x.com".to_string(),
            is_admin: false,
        })
    }

    fn draft(name: &str) -> RecipeDraft {
        RecipeDraft {
            name: name.to_string(),
            description: "Slowly simmered".to_string(),
            duration: Some("2h".to_string()),
            image: None,
        }
    }

    async fn service() -> (SeaOrmRecipeService, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("cookbook-uploads-{}", uuid::Uuid::new_v4()));
        let service = SeaOrmRecipeService::new(
            temp_store().await,
            Arc::new(ImageService::new(&dir)),
        );
        (service, dir)
    }

    #[test]
    fn name_limits() {
        assert!(validate_name("Goulash").is_ok());
        assert!(validate_name(&"a".repeat(45)).is_ok());
        assert!(validate_name(&"a".repeat(46)).is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_description("").is_err());
        assert!(validate_ingredient(" ").is_err());
    }

    #[tokio::test]
    async fn mutations_require_admin() {
        let (service, _) = service().await;

        assert!(matches!(
            service.create(&SessionContext::anonymous(), draft("Soup")).await,
            Err(RecipeError::Unauthorized)
        ));
        assert!(matches!(
            service.create(&guest(), draft("Soup")).await,
            Err(RecipeError::Forbidden)
        ));
        assert!(matches!(
            service.latest(&guest()).await,
            Err(RecipeError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn create_search_and_detail() {
        let (service, dir) = service().await;

        let mut with_image = draft("Goulash");
        with_image.image = Some(ImageUpload {
            filename: "goulash.jpg".to_string(),
            bytes: b"jpeg".to_vec(),
        });
        let goulash = service.create(&admin(), with_image).await.unwrap();
        assert!(goulash.image_path.as_deref().unwrap().ends_with("-goulash.jpg"));
        service.create(&admin(), draft("Apple strudel")).await.unwrap();

        assert_eq!(service.list().await.unwrap().count, 2);
        let found = service.search(Some("strudel")).await.unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.recipes[0].name, "Apple strudel");
        assert_eq!(service.search(Some("  ")).await.unwrap().count, 2);

        service
            .add_ingredient(&admin(), goulash.id, "Paprika")
            .await
            .unwrap();

        let detail = service
            .detail(&SessionContext::anonymous(), goulash.id)
            .await
            .unwrap();
        assert_eq!(detail.ingredients.len(), 1);
        assert!(detail.comments.is_empty());
        assert!(!detail.is_authenticated);

        let latest = service.latest(&admin()).await.unwrap().unwrap();
        assert_eq!(latest.name, "Apple strudel");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn update_renames_only_own_ingredients() {
        let (service, _) = service().await;

        let soup = service.create(&admin(), draft("Soup")).await.unwrap();
        let stew = service.create(&admin(), draft("Stew")).await.unwrap();
        let salt = service.add_ingredient(&admin(), soup.id, "Salt").await.unwrap();
        let beef = service.add_ingredient(&admin(), stew.id, "Beef").await.unwrap();

        let detail = service
            .update(
                &admin(),
                soup.id,
                RecipeUpdate {
                    name: "Clear soup".to_string(),
                    description: "Light".to_string(),
                    ingredients: vec![
                        IngredientRename {
                            id: salt.id,
                            name: "Sea salt".to_string(),
                        },
                        IngredientRename {
                            id: beef.id,
                            name: "Tofu".to_string(),
                        },
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(detail.recipe.name, "Clear soup");
        assert_eq!(detail.ingredients[0].name, "Sea salt");

        let stew_detail = service.detail(&admin(), stew.id).await.unwrap();
        assert_eq!(stew_detail.ingredients[0].name, "Beef");
    }

    #[tokio::test]
    async fn delete_and_missing_recipe() {
        let (service, _) = service().await;
        let soup = service.create(&admin(), draft("Soup")).await.unwrap();

        service.delete(&admin(), soup.id).await.unwrap();
        assert!(matches!(
            service.detail(&admin(), soup.id).await,
            Err(RecipeError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&admin(), soup.id).await,
            Err(RecipeError::NotFound(_))
        ));
        assert!(matches!(
            service.add_ingredient(&admin(), soup.id, "Salt").await,
            Err(RecipeError::NotFound(_))
        ));
    }
}
