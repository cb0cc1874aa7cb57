//! Recipe endpoints.
//!
//! Handlers map HTTP onto [`RecipeService`](crate::services::RecipeService);
//! the admin checks live in the service.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::validation::validate_recipe_id;
use crate::api::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::SessionContext;
use crate::models::recipe::{ImageUpload, Ingredient, Recipe, RecipeDraft, RecipeUpdate};
use crate::services::{RecipeDetail, RecipeError, RecipeList};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddIngredientRequest {
    pub name: String,
}

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NotFound(id) => Self::recipe_not_found(id),
            RecipeError::Validation(msg) => Self::validation(msg),
            RecipeError::Unauthorized => Self::unauthorized(),
            RecipeError::Forbidden => Self::forbidden(),
            RecipeError::Database(msg) => Self::DatabaseError(msg),
            RecipeError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RecipeList>>, ApiError> {
    let recipes = state.recipe_service().list().await?;
    Ok(Json(ApiResponse::success(recipes)))
}

/// GET /recipes/search?name=
pub async fn search_recipes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<RecipeList>>, ApiError> {
    let recipes = state
        .recipe_service()
        .search(query.name.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(recipes)))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDetail>>, ApiError> {
    let id = validate_recipe_id(id)?;
    let detail = state.recipe_service().detail(&ctx, id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// POST /recipes (multipart: name, description, duration, image)
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Recipe>>), ApiError> {
    let mut draft = RecipeDraft::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Failed to parse multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read image: {e}")))?;
                draft.image = Some(ImageUpload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "name" | "description" | "duration" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid field {field_name}: {e}")))?;
                match field_name.as_str() {
                    "name" => draft.name = value,
                    "description" => draft.description = value,
                    _ => draft.duration = Some(value),
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let recipe = state.recipe_service().create(&ctx, draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(recipe))))
}

/// PUT /recipes/{id}
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<i32>,
    Json(update): Json<RecipeUpdate>,
) -> Result<Json<ApiResponse<RecipeDetail>>, ApiError> {
    let id = validate_recipe_id(id)?;
    let detail = state.recipe_service().update(&ctx, id, update).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// DELETE /recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_recipe_id(id)?;
    state.recipe_service().delete(&ctx, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Recipe {id} deleted"
    )))))
}

/// POST /recipes/{id}/ingredients
pub async fn add_ingredient(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<i32>,
    Json(payload): Json<AddIngredientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Ingredient>>), ApiError> {
    let id = validate_recipe_id(id)?;
    let ingredient = state
        .recipe_service()
        .add_ingredient(&ctx, id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(ingredient))))
}

/// GET /admin/latest-recipe
pub async fn latest_recipe(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Json<ApiResponse<Option<Recipe>>>, ApiError> {
    let recipe = state.recipe_service().latest(&ctx).await?;
    Ok(Json(ApiResponse::success(recipe)))
}
