// src/store/postgres.rs

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::{
    error::StoreError,
    models::{
        ad::{Ad, AdFields, Asset, PictureInfo, Price},
        comment::{Comment, NewComment},
    },
};

use super::Store;

/// Columns shared by every query returning an `AdRow`.
/// Picture bytes are never selected here, only their length.
macro_rules! select_ad {
    () => {
        r#"
        SELECT
            a.id, a.owner_id, a.title, a.price_cents, a.text, a.content_type,
            octet_length(a.picture)::BIGINT AS picture_size,
            ARRAY(SELECT t.tag::TEXT FROM ad_tags t WHERE t.ad_id = a.id ORDER BY t.tag)::TEXT[] AS tags,
            a.created_at, a.updated_at
        FROM ads a
        "#
    };
}

/// Row shape of `select_ad!`.
#[derive(Debug, FromRow)]
struct AdRow {
    id: i64,
    owner_id: i64,
    title: String,
    price_cents: Option<i64>,
    text: String,
    content_type: Option<String>,
    picture_size: Option<i64>,
    tags: Vec<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<AdRow> for Ad {
    fn from(row: AdRow) -> Self {
        let picture = row
            .content_type
            .zip(row.picture_size)
            .map(|(content_type, size)| PictureInfo {
                content_type,
                size: u64::try_from(size).unwrap_or_default(),
            });

        Ad {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            price: row.price_cents.map(Price::from_cents),
            text: row.text,
            picture,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `Store` backed by PostgreSQL.
///
/// Multi-statement writes run inside a single transaction; cascades and the
/// favorite uniqueness rule come from the schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_ad(
        &self,
        owner_id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Ad, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (bytes, content_type) = picture
            .map(|asset| (asset.bytes, asset.content_type))
            .unzip();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ads (owner_id, title, price_cents, text, picture, content_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&fields.title)
        .bind(fields.price.map(Price::cents))
        .bind(&fields.text)
        .bind(bytes)
        .bind(content_type)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO ad_tags (ad_id, tag) SELECT $1, UNNEST($2::TEXT[])")
            .bind(id)
            .bind(&fields.tags)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, AdRow>(concat!(select_ad!(), "WHERE a.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn update_ad(
        &self,
        id: i64,
        fields: AdFields,
        picture: Option<Asset>,
    ) -> Result<Option<Ad>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (bytes, content_type) = picture
            .map(|asset| (asset.bytes, asset.content_type))
            .unzip();

        let updated = sqlx::query(
            r#"
            UPDATE ads
            SET title = $2,
                price_cents = $3,
                text = $4,
                picture = COALESCE($5, picture),
                content_type = COALESCE($6, content_type),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(fields.price.map(Price::cents))
        .bind(&fields.text)
        .bind(bytes)
        .bind(content_type)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM ad_tags WHERE ad_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO ad_tags (ad_id, tag) SELECT $1, UNNEST($2::TEXT[])")
            .bind(id)
            .bind(&fields.tags)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, AdRow>(concat!(select_ad!(), "WHERE a.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(row.into()))
    }

    async fn get_ad(&self, id: i64) -> Result<Option<Ad>, StoreError> {
        let row = sqlx::query_as::<_, AdRow>(concat!(select_ad!(), "WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Ad::from))
    }

    async fn delete_ad(&self, id: i64) -> Result<bool, StoreError> {
        // Tags, comments and favorites go with it (ON DELETE CASCADE).
        let deleted = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn search_ads(&self, query: Option<&str>) -> Result<Vec<Ad>, StoreError> {
        let rows = sqlx::query_as::<_, AdRow>(concat!(
            select_ad!(),
            r#"
            WHERE $1::TEXT IS NULL
               OR strpos(lower(a.title), lower($1)) > 0
               OR strpos(lower(a.text), lower($1)) > 0
               OR EXISTS (SELECT 1 FROM ad_tags t WHERE t.ad_id = a.id AND t.tag = $1)
            ORDER BY a.updated_at DESC, a.id DESC
            "#
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Ad::from).collect())
    }

    async fn fetch_asset(&self, ad_id: i64) -> Result<Option<Option<Asset>>, StoreError> {
        let row: Option<(Option<Vec<u8>>, Option<String>)> =
            sqlx::query_as("SELECT picture, content_type FROM ads WHERE id = $1")
                .bind(ad_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(bytes, content_type)| {
            bytes
                .zip(content_type)
                .map(|(bytes, content_type)| Asset {
                    bytes,
                    content_type,
                })
        }))
    }

    async fn insert_favorite(&self, user_id: i64, ad_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO favorites (ad_id, user_id) VALUES ($1, $2)")
            .bind(ad_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_favorite(&self, user_id: i64, ad_id: i64) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM favorites WHERE ad_id = $1 AND user_id = $2")
            .bind(ad_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn favorite_ad_ids(&self, user_id: i64) -> Result<HashSet<i64>, StoreError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT ad_id FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().collect())
    }

    async fn count_favorites(&self, ad_id: i64) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE ad_id = $1")
            .bind(ad_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (ad_id, owner_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, ad_id, owner_id, text, created_at, updated_at
            "#,
        )
        .bind(comment.ad_id)
        .bind(comment.owner_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, ad_id, owner_id, text, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn list_comments(&self, ad_id: i64) -> Result<Vec<Comment>, StoreError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, ad_id, owner_id, text, created_at, updated_at
            FROM comments
            WHERE ad_id = $1
            ORDER BY updated_at DESC, id DESC
            "#,
        )
        .bind(ad_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
