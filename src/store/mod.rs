// src/store/mod.rs

pub mod memory;
pub mod postgres;

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::{
        ad::{Ad, AdFields, Asset},
        comment::{Comment, NewComment},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence contract for ads, comments and favorites.
///
/// Every mutating method is atomic: either all of its rows become visible
/// or none do. Deleting an ad removes its tags, comments and favorites.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Inserts an ad with its tags and optional picture.
    async fn insert_ad(
        &self,
        owner_id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Ad, StoreError>;

    /// Replaces the ad's fields and tags. `None` keeps the stored picture.
    /// Returns `None` when the ad does not exist.
    async fn update_ad(
        &self,
        id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Option<Ad>, StoreError>;

    async fn get_ad(&self, id: i64) -> Result<Option<Ad>, StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_ad(&self, id: i64) -> Result<bool, StoreError>;

    /// Most recently updated first. `None` lists every ad.
    async fn search_ads(&self, query: Option<&str>) -> Result<Vec<Ad>, StoreError>;

    /// Outer `None`: no such ad. Inner `None`: the ad has no picture.
    async fn fetch_asset(&self, ad_id: i64) -> Result<Option<Option<Asset>>, StoreError>;

    /// Fails with `StoreError::UniqueViolation` when the pair already exists
    /// and `StoreError::ForeignKeyViolation` when the ad is gone.
    async fn insert_favorite(&self, user_id: i64, ad_id: i64) -> Result<(), StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_favorite(&self, user_id: i64, ad_id: i64) -> Result<bool, StoreError>;

    async fn favorite_ad_ids(&self, user_id: i64) -> Result<HashSet<i64>, StoreError>;

    async fn count_favorites(&self, ad_id: i64) -> Result<i64, StoreError>;

    /// Fails with `StoreError::ForeignKeyViolation` when the ad is gone.
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, StoreError>;

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError>;

    /// Most recently updated first.
    async fn list_comments(&self, ad_id: i64) -> Result<Vec<Comment>, StoreError>;
}

/// Lets services share one store behind an `Arc`.
#[async_trait]
impl<T: Store + ?Sized> Store for Arc<T> {
    async fn insert_ad(
        &self,
        owner_id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Ad, StoreError> {
        (**self).insert_ad(owner_id, fields, picture).await
    }

    async fn update_ad(
        &self,
        id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Option<Ad>, StoreError> {
        (**self).update_ad(id, fields, picture).await
    }

    async fn get_ad(&self, id: i64) -> Result<Option<Ad>, StoreError> {
        (**self).get_ad(id).await
    }

    async fn delete_ad(&self, id: i64) -> Result<bool, StoreError> {
        (**self).delete_ad(id).await
    }

    async fn search_ads(&self, query: Option<&str>) -> Result<Vec<Ad>, StoreError> {
        (**self).search_ads(query).await
    }

    async fn fetch_asset(&self, ad_id: i64) -> Result<Option<Option<Asset>>, StoreError> {
        (**self).fetch_asset(ad_id).await
    }

    async fn insert_favorite(&self, user_id: i64, ad_id: i64) -> Result<(), StoreError> {
        (**self).insert_favorite(user_id, ad_id).await
    }

    async fn delete_favorite(&self, user_id: i64, ad_id: i64) -> Result<bool, StoreError> {
        (**self).delete_favorite(user_id, ad_id).await
    }

    async fn favorite_ad_ids(&self, user_id: i64) -> Result<HashSet<i64>, StoreError> {
        (**self).favorite_ad_ids(user_id).await
    }

    async fn count_favorites(&self, ad_id: i64) -> Result<i64, StoreError> {
        (**self).count_favorites(ad_id).await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        (**self).insert_comment(comment).await
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        (**self).get_comment(id).await
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        (**self).delete_comment(id).await
    }

    async fn list_comments(&self, ad_id: i64) -> Result<Vec<Comment>, StoreError> {
        (**self).list_comments(ad_id).await
    }
}
