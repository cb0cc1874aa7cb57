use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::validation::validate_recipe_id;
use crate::api::{ApiError, ApiResponse, AppState};
use crate::domain::{CommentId, SessionContext};
use crate::services::{CommentError, CommentThread, PostedComment};

#[derive(Debug, Deserialize)]
pub struct PostCommentRequest {
    pub body: String,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Serialize)]
pub struct CommentsDeleted {
    pub deleted: u64,
}

impl From<CommentError> for ApiError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::RecipeNotFound(id) => Self::recipe_not_found(id),
            CommentError::Validation(msg) => Self::validation(msg),
            CommentError::Unauthorized => Self::unauthorized(),
            CommentError::Forbidden => Self::forbidden(),
            CommentError::Database(msg) => Self::DatabaseError(msg),
            CommentError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// GET /recipes/{id}/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CommentThread>>, ApiError> {
    let id = validate_recipe_id(id)?;
    let thread = state.comment_service().thread(id).await?;
    Ok(Json(ApiResponse::success(thread)))
}

/// POST /recipes/{id}/comments
pub async fn post_comment(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<i32>,
    Json(payload): Json<PostCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostedComment>>), ApiError> {
    let id = validate_recipe_id(id)?;
    let posted = state
        .comment_service()
        .post(&ctx, id, payload.parent_id, &payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(posted))))
}

/// DELETE /recipes/{id}/comments
pub async fn delete_comments(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CommentsDeleted>>, ApiError> {
    let id = validate_recipe_id(id)?;
    let deleted = state.comment_service().delete_for_recipe(&ctx, id).await?;
    Ok(Json(ApiResponse::success(CommentsDeleted { deleted })))
}
