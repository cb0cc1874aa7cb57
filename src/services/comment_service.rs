//! Domain service for recipe comments and replies.

use serde::Serialize;
use thiserror::Error;

use crate::domain::comment_tree::CommentNode;
use crate::domain::{CommentId, RecipeId, SessionContext};

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Recipe not found: {0}")]
    RecipeNotFound(RecipeId),

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

impl From<sea_orm::DbErr> for CommentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CommentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostedComment {
    pub id: CommentId,
    pub recipe_id: RecipeId,
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    pub recipe_id: RecipeId,
    pub comments: Vec<CommentNode>,
    pub count: usize,
}

#[async_trait::async_trait]
pub trait CommentService: Send + Sync {
    /// Posts a comment, or a reply when `parent_id` is given.
    ///
    /// The parent has to be a comment on the same recipe.
    async fn post(
        &self,
        ctx: &SessionContext,
        recipe_id: RecipeId,
        parent_id: Option<CommentId>,
        body: &str,
    ) -> Result<PostedComment, CommentError>;

    async fn thread(&self, recipe_id: RecipeId) -> Result<CommentThread, CommentError>;

    /// Removes every comment of a recipe. Returns how many rows went.
    async fn delete_for_recipe(
        &self,
        ctx: &SessionContext,
        recipe_id: RecipeId,
    ) -> Result<u64, CommentError>;
}
