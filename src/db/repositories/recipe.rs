use crate::domain::RecipeId;
use crate::entities::{ingredients, prelude::*, recipes};
use crate::models::recipe::{Ingredient, IngredientRename, NewRecipe, Recipe};
use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

/// Repository for recipes and their ingredients
pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_recipe(r: recipes::Model) -> Recipe {
        Recipe {
            id: RecipeId::new(r.id),
            name: r.name,
            description: r.description,
            duration: r.duration,
            image_path: r.image_path,
            created_at: r.created_at,
        }
    }

    fn map_ingredient(i: ingredients::Model) -> Ingredient {
        Ingredient {
            id: i.id,
            name: i.name,
            recipe_id: RecipeId::new(i.recipe_id),
        }
    }

    // ========================================================================
    // Recipe Operations
    // ========================================================================

    pub async fn list_all(&self) -> Result<Vec<Recipe>> {
        let rows = Recipes::find()
            .order_by_asc(recipes::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_recipe).collect())
    }

    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Recipe>> {
        let rows = Recipes::find()
            .filter(recipes::Column::Name.contains(fragment))
            .order_by_asc(recipes::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_recipe).collect())
    }

    pub async fn get(&self, id: RecipeId) -> Result<Option<Recipe>> {
        let row = Recipes::find_by_id(id.value()).one(&self.conn).await?;
        Ok(row.map(Self::map_recipe))
    }

    pub async fn latest(&self) -> Result<Option<Recipe>> {
        let row = Recipes::find()
            .order_by_desc(recipes::Column::Id)
            .one(&self.conn)
            .await?;

        Ok(row.map(Self::map_recipe))
    }

    pub async fn add(&self, recipe: &NewRecipe) -> Result<Recipe> {
        let active_model = recipes::ActiveModel {
            name: Set(recipe.name.clone()),
            description: Set(recipe.description.clone()),
            duration: Set(recipe.duration.clone()),
            image_path: Set(recipe.image_path.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert recipe")?;
        info!("Added recipe {}: {}", model.id, model.name);
        Ok(Self::map_recipe(model))
    }

    /// Rename/re-describe a recipe and rename its ingredients in one
    /// transaction. Ingredient ids that belong to another recipe are skipped.
    pub async fn update(
        &self,
        id: RecipeId,
        name: &str,
        description: &str,
        renames: &[IngredientRename],
    ) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let result = Recipes::update_many()
            .set(recipes::ActiveModel {
                name: Set(name.to_string()),
                description: Set(description.to_string()),
                ..Default::default()
            })
            .filter(recipes::Column::Id.eq(id.value()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        for rename in renames {
            Ingredients::update_many()
                .set(ingredients::ActiveModel {
                    name: Set(rename.name.clone()),
                    ..Default::default()
                })
                .filter(ingredients::Column::Id.eq(rename.id))
                .filter(ingredients::Column::RecipeId.eq(id.value()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(true)
    }

    /// Ingredients and comments go with it (foreign key cascade).
    pub async fn remove(&self, id: RecipeId) -> Result<bool> {
        let result = Recipes::delete_by_id(id.value())
            .exec(&self.conn)
            .await?;

        if result.rows_affected > 0 {
            info!("Removed recipe {}", id);
        }
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Ingredient Operations
    // ========================================================================

    pub async fn ingredients_for(&self, recipe_id: RecipeId) -> Result<Vec<Ingredient>> {
        let rows = Ingredients::find()
            .filter(ingredients::Column::RecipeId.eq(recipe_id.value()))
            .order_by_asc(ingredients::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_ingredient).collect())
    }

    pub async fn add_ingredient(&self, recipe_id: RecipeId, name: &str) -> Result<Ingredient> {
        let active_model = ingredients::ActiveModel {
            name: Set(name.to_string()),
            recipe_id: Set(recipe_id.value()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert ingredient")?;
        Ok(Self::map_ingredient(model))
    }
}
