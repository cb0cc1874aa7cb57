use crate::domain::comment_tree::FlatComment;
use crate::domain::{CommentId, RecipeId, UserId};
use crate::entities::{comments, prelude::*};
use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Stored comment without the author join.
#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: CommentId,
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
}

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
        parent_id: Option<CommentId>,
        body: &str,
    ) -> Result<CommentId> {
        let active_model = comments::ActiveModel {
            body: Set(body.to_string()),
            user_id: Set(user_id.value()),
            recipe_id: Set(recipe_id.value()),
            parent_id: Set(parent_id.map(|p| p.value())),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert comment")?;
        Ok(CommentId::new(model.id))
    }

    pub async fn get(&self, id: CommentId) -> Result<Option<CommentRow>> {
        let row = Comments::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query comment")?;

        Ok(row.map(|c| CommentRow {
            id: CommentId::new(c.id),
            recipe_id: RecipeId::new(c.recipe_id),
            user_id: UserId::new(c.user_id),
            parent_id: c.parent_id.map(CommentId::new),
        }))
    }

    /// All comments of a recipe in posting order, with author names.
    pub async fn list_for_recipe(&self, recipe_id: RecipeId) -> Result<Vec<FlatComment>> {
        let rows = Comments::find()
            .filter(comments::Column::RecipeId.eq(recipe_id.value()))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .find_also_related(Users)
            .all(&self.conn)
            .await
            .context("Failed to list comments")?;

        Ok(rows
            .into_iter()
            .map(|(c, author)| FlatComment {
                id: CommentId::new(c.id),
                parent_id: c.parent_id.map(CommentId::new),
                recipe_id: RecipeId::new(c.recipe_id),
                author_id: UserId::new(c.user_id),
                author_name: author.map(|u| u.name).unwrap_or_default(),
                body: c.body,
                created_at: c.created_at,
            })
            .collect())
    }

    pub async fn delete_for_recipe(&self, recipe_id: RecipeId) -> Result<u64> {
        let result = Comments::delete_many()
            .filter(comments::Column::RecipeId.eq(recipe_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to delete comments")?;

        Ok(result.rows_affected)
    }
}
