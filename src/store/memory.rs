// src/store/memory.rs

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    error::StoreError,
    models::{
        ad::{Ad, AdFields, Asset},
        comment::{Comment, NewComment},
        favorite::Favorite,
    },
};

use super::Store;

#[derive(Debug)]
struct AdRecord {
    ad: Ad,
    picture: Option<Asset>,
}

#[derive(Default)]
struct Tables {
    next_ad_id: i64,
    next_comment_id: i64,
    ads: BTreeMap<i64, AdRecord>,
    comments: BTreeMap<i64, Comment>,
    favorites: Vec<Favorite>,
}

/// In-process `Store` with the same semantics as `PgStore`.
///
/// A single mutex guards all tables, so every operation is atomic. Used by
/// the test suites and when no `DATABASE_URL` is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ad_matches(ad: &Ad, query: &str) -> bool {
    let needle = query.to_lowercase();
    ad.title.to_lowercase().contains(&needle)
        || ad.text.to_lowercase().contains(&needle)
        || ad.tags.iter().any(|tag| tag == query)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_ad(
        &self,
        owner_id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Ad, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.next_ad_id += 1;
        let id = tables.next_ad_id;
        let now = Utc::now();

        let ad = Ad {
            id,
            owner_id,
            title: fields.title,
            price: fields.price,
            text: fields.text,
            picture: picture.as_ref().map(Asset::info),
            tags: fields.tags,
            created_at: now,
            updated_at: now,
        };
        tables.ads.insert(
            id,
            AdRecord {
                ad: ad.clone(),
                picture,
            },
        );

        Ok(ad)
    }

    async fn update_ad(
        &self,
        id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Option<Ad>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(record) = tables.ads.get_mut(&id) else {
            return Ok(None);
        };

        record.ad.title = fields.title;
        record.ad.price = fields.price;
        record.ad.text = fields.text;
        record.ad.tags = fields.tags;
        record.ad.updated_at = Utc::now();
        if let Some(asset) = picture {
            record.ad.picture = Some(asset.info());
            record.picture = Some(asset);
        }

        Ok(Some(record.ad.clone()))
    }

    async fn get_ad(&self, id: i64) -> Result<Option<Ad>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.ads.get(&id).map(|record| record.ad.clone()))
    }

    async fn delete_ad(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.ads.remove(&id).is_none() {
            return Ok(false);
        }

        tables.comments.retain(|_, comment| comment.ad_id != id);
        tables.favorites.retain(|favorite| favorite.ad_id != id);
        Ok(true)
    }

    async fn search_ads(&self, query: Option<&str>) -> Result<Vec<Ad>, StoreError> {
        let tables = self.tables.lock().await;
        let mut ads: Vec<Ad> = tables
            .ads
            .values()
            .map(|record| &record.ad)
            .filter(|ad| query.is_none_or(|q| ad_matches(ad, q)))
            .cloned()
            .collect();

        ads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(ads)
    }

    async fn fetch_asset(&self, ad_id: i64) -> Result<Option<Option<Asset>>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.ads.get(&ad_id).map(|record| record.picture.clone()))
    }

    async fn insert_favorite(&self, user_id: i64, ad_id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.ads.contains_key(&ad_id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        if tables
            .favorites
            .iter()
            .any(|f| f.ad_id == ad_id && f.user_id == user_id)
        {
            return Err(StoreError::UniqueViolation);
        }

        tables.favorites.push(Favorite {
            ad_id,
            user_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_favorite(&self, user_id: i64, ad_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.ad_id == ad_id && f.user_id == user_id));
        Ok(tables.favorites.len() < before)
    }

    async fn favorite_ad_ids(&self, user_id: i64) -> Result<HashSet<i64>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.ad_id)
            .collect())
    }

    async fn count_favorites(&self, ad_id: i64) -> Result<i64, StoreError> {
        let tables = self.tables.lock().await;
        let count = tables.favorites.iter().filter(|f| f.ad_id == ad_id).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.ads.contains_key(&comment.ad_id) {
            return Err(StoreError::ForeignKeyViolation);
        }

        tables.next_comment_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id: tables.next_comment_id,
            ad_id: comment.ad_id,
            owner_id: comment.owner_id,
            text: comment.text,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.comments.get(&id).cloned())
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.comments.remove(&id).is_some())
    }

    async fn list_comments(&self, ad_id: i64) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.lock().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.ad_id == ad_id)
            .cloned()
            .collect();

        comments.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }
}
