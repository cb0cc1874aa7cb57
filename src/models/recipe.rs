use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RecipeId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub duration: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub recipe_id: RecipeId,
}

/// Input for a new recipe; the image is already stored when this is built.
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub description: String,
    pub duration: Option<String>,
    pub image_path: Option<String>,
}

/// Edit of an existing recipe. Ingredient entries rename by id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientRename>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRename {
    pub id: i32,
    pub name: String,
}

/// Photo attached to a new recipe, as received from the form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Recipe form before validation and image storage.
#[derive(Debug, Clone, Default)]
pub struct RecipeDraft {
    pub name: String,
    pub description: String,
    pub duration: Option<String>,
    pub image: Option<ImageUpload>,
}
