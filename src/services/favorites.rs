// src/services/favorites.rs

use std::{collections::HashSet, sync::Arc};

use crate::{
    error::{AppError, StoreError},
    store::Store,
};

/// Idempotent bookmarking of ads.
#[derive(Clone)]
pub struct FavoriteService {
    store: Arc<dyn Store>,
}

impl FavoriteService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Adding a favorite that already exists is a no-op. Two concurrent adds
    /// race on the unique constraint; the loser is treated as success.
    pub async fn add(&self, user_id: i64, ad_id: i64) -> Result<(), AppError> {
        match self.store.insert_favorite(user_id, ad_id).await {
            Ok(()) => {
                tracing::info!(user_id, ad_id, "favorite added");
                Ok(())
            }
            Err(StoreError::UniqueViolation) => {
                tracing::debug!(user_id, ad_id, "favorite already present");
                Ok(())
            }
            Err(StoreError::ForeignKeyViolation) => Err(AppError::NotFound("Ad".to_string())),
            Err(e) => {
                tracing::error!("Failed to add favorite: {:?}", e);
                Err(e.into())
            }
        }
    }

    /// Removing a favorite that does not exist is a no-op.
    pub async fn remove(&self, user_id: i64, ad_id: i64) -> Result<(), AppError> {
        if self.store.get_ad(ad_id).await?.is_none() {
            return Err(AppError::NotFound("Ad".to_string()));
        }

        if self.store.delete_favorite(user_id, ad_id).await? {
            tracing::info!(user_id, ad_id, "favorite removed");
        } else {
            tracing::debug!(user_id, ad_id, "no favorite to remove");
        }
        Ok(())
    }

    /// Ads the caller has favorited; always empty for anonymous callers.
    pub async fn list_favorite_ad_ids(
        &self,
        user_id: Option<i64>,
    ) -> Result<HashSet<i64>, AppError> {
        match user_id {
            Some(user_id) => Ok(self.store.favorite_ad_ids(user_id).await?),
            None => Ok(HashSet::new()),
        }
    }

    pub async fn count(&self, ad_id: i64) -> Result<i64, AppError> {
        Ok(self.store.count_favorites(ad_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ad::AdFields;
    use crate::store::MemoryStore;

    async fn setup() -> (FavoriteService, Arc<MemoryStore>, i64) {
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
        (FavoriteService::new(store.clone()), store, ad.id)
    }

    #[tokio::test]
    async fn adding_twice_keeps_a_single_favorite() {
        let (favorites, _, ad_id) = setup().await;

        favorites.add(7, ad_id).await.unwrap();
        favorites.add(7, ad_id).await.unwrap();

        assert_eq!(favorites.count(ad_id).await.unwrap(), 1);
        assert_eq!(
            favorites.list_favorite_ad_ids(Some(7)).await.unwrap(),
            HashSet::from([ad_id])
        );
    }

    #[tokio::test]
    async fn concurrent_adds_both_succeed() {
        let (favorites, _, ad_id) = setup().await;

        let (a, b) = tokio::join!(favorites.add(7, ad_id), favorites.add(7, ad_id));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(favorites.count(ad_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn removing_absent_favorite_is_ok() {
        let (favorites, _, ad_id) = setup().await;

        favorites.remove(7, ad_id).await.unwrap();

        favorites.add(7, ad_id).await.unwrap();
        favorites.remove(7, ad_id).await.unwrap();
        favorites.remove(7, ad_id).await.unwrap();
        assert_eq!(favorites.count(ad_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_ad_is_not_found() {
        let (favorites, _, _) = setup().await;
        assert!(matches!(favorites.add(7, 404).await, Err(AppError::NotFound(_))));
        assert!(matches!(favorites.remove(7, 404).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn anonymous_caller_has_no_favorites() {
        let (favorites, _, ad_id) = setup().await;
        favorites.add(7, ad_id).await.unwrap();
        assert!(favorites.list_favorite_ad_ids(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_the_ad_drops_its_favorites() {
        let (favorites, store, ad_id) = setup().await;
        favorites.add(7, ad_id).await.unwrap();

        assert!(store.delete_ad(ad_id).await.unwrap());
        assert!(favorites.list_favorite_ad_ids(Some(7)).await.unwrap().is_empty());
    }
}
