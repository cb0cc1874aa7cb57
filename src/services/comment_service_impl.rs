//! `SeaORM` implementation of the `CommentService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::constants::limits::MAX_COMMENT_LEN;
use crate::db::Store;
use crate::domain::comment_tree::{build_comment_tree, count_nodes};
use crate::domain::{CommentId, RecipeId, SessionContext};
use crate::services::comment_service::{
    CommentError, CommentService, CommentThread, PostedComment,
};

pub struct SeaOrmCommentService {
    store: Store,
}

impl SeaOrmCommentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn ensure_recipe(&self, recipe_id: RecipeId) -> Result<(), CommentError> {
        if self.store.get_recipe(recipe_id).await?.is_none() {
            return Err(CommentError::RecipeNotFound(recipe_id));
        }
        Ok(())
    }
}

fn validate_body(body: &str) -> Result<&str, CommentError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(CommentError::Validation("Comment cannot be empty".to_string()));
    }
    if body.chars().count() > MAX_COMMENT_LEN {
        return Err(CommentError::Validation(format!(
            "Comment must be {MAX_COMMENT_LEN} characters or less"
        )));
    }
    Ok(body)
}

#[async_trait]
impl CommentService for SeaOrmCommentService {
    async fn post(
        &self,
        ctx: &SessionContext,
        recipe_id: RecipeId,
        parent_id: Option<CommentId>,
        body: &str,
    ) -> Result<PostedComment, CommentError> {
        let author = ctx.current_user_id().ok_or(CommentError::Unauthorized)?;
        let body = validate_body(body)?;
        self.ensure_recipe(recipe_id).await?;

        if let Some(parent_id) = parent_id {
            let parent = self.store.get_comment(parent_id).await?;
            if parent.is_none_or(|p| p.recipe_id != recipe_id) {
                return Err(CommentError::Validation(format!(
                    "Comment {parent_id} is not part of this recipe"
                )));
            }
        }

        let id = self
            .store
            .add_comment(recipe_id, author, parent_id, body)
            .await?;

        metrics::counter!("comments_posted_total").increment(1);
        info!(comment_id = %id, recipe_id = %recipe_id, user_id = %author, "Comment posted");

        Ok(PostedComment {
            id,
            recipe_id,
            parent_id,
        })
    }

    async fn thread(&self, recipe_id: RecipeId) -> Result<CommentThread, CommentError> {
        self.ensure_recipe(recipe_id).await?;

        let comments = build_comment_tree(self.store.list_comments(recipe_id).await?);
        Ok(CommentThread {
            recipe_id,
            count: count_nodes(&comments),
            comments,
        })
    }

    async fn delete_for_recipe(
        &self,
        ctx: &SessionContext,
        recipe_id: RecipeId,
    ) -> Result<u64, CommentError> {
        if !ctx.is_authenticated() {
            return Err(CommentError::Unauthorized);
        }
        if !ctx.is_admin() {
            return Err(CommentError::Forbidden);
        }
        self.ensure_recipe(recipe_id).await?;

        let removed = self.store.delete_comments_for_recipe(recipe_id).await?;
        info!(recipe_id = %recipe_id, removed, "Deleted recipe comments");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::db::test_support::temp_store;
    use crate::domain::{SessionUser, UserId};
    use crate::models::recipe::NewRecipe;

    struct Fixture {
        store: Store,
        service: SeaOrmCommentService,
        cook: SessionContext,
        admin: SessionContext,
    }

    async fn fixture() -> Fixture {
        let store = temp_store().await;
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let user = store
            .create_user("Anna", "a@x.com", "pw1234", &security)
            .await
            .unwrap();

        let session_user = SessionUser {
            id: UserId::new(user.id),
            name: user.name,
            email: user.email,
            is_admin: false,
        };

        Fixture {
            service: SeaOrmCommentService::new(store.clone()),
            store,
            cook: SessionContext::authenticated(session_user.clone()),
            admin: SessionContext::authenticated(SessionUser {
                is_admin: true,
                ..session_user
            }),
        }
    }

    async fn recipe(store: &Store, name: &str) -> RecipeId {
        store
            .add_recipe(&NewRecipe {
                name: name.to_string(),
                description: "Tasty".to_string(),
                ..NewRecipe::default()
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn body_limits() {
        assert_eq!(validate_body("  nice  ").unwrap(), "nice");
        assert!(validate_body("   ").is_err());
        assert!(validate_body(&"x".repeat(MAX_COMMENT_LEN)).is_ok());
        assert!(validate_body(&"x".repeat(MAX_COMMENT_LEN + 1)).is_err());
    }

    #[tokio::test]
    async fn replies_form_a_thread() {
        let f = fixture().await;
        let soup = recipe(&f.store, "Soup").await;

        let top = f.service.post(&f.cook, soup, None, "Lovely").await.unwrap();
        let reply = f
            .service
            .post(&f.cook, soup, Some(top.id), "Agreed")
            .await
            .unwrap();
        f.service
            .post(&f.cook, soup, Some(reply.id), "Same")
            .await
            .unwrap();
        f.service.post(&f.cook, soup, None, "Too salty").await.unwrap();

        let thread = f.service.thread(soup).await.unwrap();
        assert_eq!(thread.count, 4);
        assert_eq!(thread.comments.len(), 2);
        assert_eq!(thread.comments[0].body, "Lovely");
        assert_eq!(thread.comments[0].author_name, "Anna");
        assert_eq!(thread.comments[0].children[0].children[0].body, "Same");
        assert_eq!(thread.comments[1].body, "Too salty");
    }

    #[tokio::test]
    async fn parent_must_belong_to_same_recipe() {
        let f = fixture().await;
        let soup = recipe(&f.store, "Soup").await;
        let stew = recipe(&f.store, "Stew").await;

        let on_soup = f.service.post(&f.cook, soup, None, "Hi").await.unwrap();

        assert!(matches!(
            f.service.post(&f.cook, stew, Some(on_soup.id), "Hi").await,
            Err(CommentError::Validation(_))
        ));
        assert!(matches!(
            f.service
                .post(&f.cook, soup, Some(CommentId::new(999)), "Hi")
                .await,
            Err(CommentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn posting_needs_login_and_recipe() {
        let f = fixture().await;
        let soup = recipe(&f.store, "Soup").await;

        assert!(matches!(
            f.service
                .post(&SessionContext::anonymous(), soup, None, "Hi")
                .await,
            Err(CommentError::Unauthorized)
        ));
        assert!(matches!(
            f.service
                .post(&f.cook, RecipeId::new(404), None, "Hi")
                .await,
            Err(CommentError::RecipeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn admin_clears_comments() {
        let f = fixture().await;
        let soup = recipe(&f.store, "Soup").await;
        let top = f.service.post(&f.cook, soup, None, "One").await.unwrap();
        f.service.post(&f.cook, soup, Some(top.id), "Two").await.unwrap();

        assert!(matches!(
            f.service.delete_for_recipe(&f.cook, soup).await,
            Err(CommentError::Forbidden)
        ));

        // Replies may go through the self-referencing cascade instead.
        assert!(f.service.delete_for_recipe(&f.admin, soup).await.unwrap() >= 1);
        assert_eq!(f.service.thread(soup).await.unwrap().count, 0);
    }
}
