use super::ApiError;
use crate::domain::RecipeId;

pub fn validate_recipe_id(id: i32) -> Result<RecipeId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid recipe ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(RecipeId::new(id))
}
