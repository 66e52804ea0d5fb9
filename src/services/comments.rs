// src/services/comments.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, StoreError},
    models::comment::{Comment, CommentForm, NewComment},
    store::Store,
};

use super::ensure_owner;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        ad_id: i64,
        owner_id: i64,
        form: CommentForm,
    ) -> Result<Comment, AppError> {
        let form = CommentForm {
            comment: form.comment.trim().to_string(),
        };
        form.validate()?;

        let comment = self
            .store
            .insert_comment(NewComment {
                ad_id,
                owner_id,
                text: form.comment,
            })
            .await
            .map_err(|e| match e {
                StoreError::ForeignKeyViolation => AppError::NotFound("Ad".to_string()),
                e => {
                    tracing::error!("Failed to create comment: {:?}", e);
                    e.into()
                }
            })?;

        tracing::info!(comment_id = comment.id, ad_id, "comment created");
        Ok(comment)
    }

    /// Owner-only.
    pub async fn delete(&self, comment_id: i64, caller_id: i64) -> Result<(), AppError> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment".to_string()))?;
        ensure_owner(comment.owner_id, caller_id, "comment")?;

        if !self.store.delete_comment(comment_id).await? {
            return Err(AppError::NotFound("Comment".to_string()));
        }

        tracing::info!(comment_id, "comment deleted");
        Ok(())
    }

    /// Most recently updated first.
    pub async fn list(&self, ad_id: i64) -> Result<Vec<Comment>, AppError> {
        Ok(self.store.list_comments(ad_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ad::AdFields;
    use crate::store::MemoryStore;

    async fn setup() -> (CommentService, Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let ad = store
            .insert_ad(
                1,
                AdFields {
                    title: "Lamp".to_string(),
                    price: None,
                    text: String::new(),
                    tags: Vec::new(),
                },
                None,
            )
            .await
            .unwrap();
        (CommentService::new(store.clone()), store, ad.id)
    }

    fn form(text: &str) -> CommentForm {
        CommentForm {
            comment: text.to_string(),
        }
    }

    #[tokio::test]
    async fn comment_needs_three_characters() {
        let (comments, _, ad_id) = setup().await;

        let err = comments.create(ad_id, 2, form("ab")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "comment"));

        let comment = comments.create(ad_id, 2, form("abc")).await.unwrap();
        assert_eq!(comment.text, "abc");
        assert_eq!(comment.owner_id, 2);
    }

    #[tokio::test]
    async fn markup_counts_as_typed() {
        let (comments, _, ad_id) = setup().await;

        let err = comments.create(ad_id, 2, form("<>")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "comment"));

        let comment = comments.create(ad_id, 2, form("a&b")).await.unwrap();
        assert_eq!(comment.text, "a&b");
        assert_eq!(comments.list(ad_id).await.unwrap()[0].text, "a&b");
    }

    #[tokio::test]
    async fn surrounding_whitespace_does_not_count() {
        let (comments, _, ad_id) = setup().await;
        assert!(comments.create(ad_id, 2, form("  ab  ")).await.is_err());
    }

    #[tokio::test]
    async fn comment_on_missing_ad_is_not_found() {
        let (comments, _, _) = setup().await;
        assert!(matches!(
            comments.create(404, 2, form("hello")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_may_delete() {
        let (comments, _, ad_id) = setup().await;
        let comment = comments.create(ad_id, 2, form("hello")).await.unwrap();

        assert!(matches!(
            comments.delete(comment.id, 3).await,
            Err(AppError::Forbidden(_))
        ));
        comments.delete(comment.id, 2).await.unwrap();
        assert!(matches!(
            comments.delete(comment.id, 2).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (comments, _, ad_id) = setup().await;
        let first = comments.create(ad_id, 2, form("first")).await.unwrap();
        let second = comments.create(ad_id, 3, form("second")).await.unwrap();

        let ids: Vec<i64> = comments.list(ad_id).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn deleting_the_ad_drops_its_comments() {
        let (comments, store, ad_id) = setup().await;
        comments.create(ad_id, 2, form("hello")).await.unwrap();

        assert!(store.delete_ad(ad_id).await.unwrap());
        assert!(comments.list(ad_id).await.unwrap().is_empty());
    }
}
