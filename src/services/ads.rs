// src/services/ads.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppError,
    models::ad::{Ad, AdFields, AdForm, AdFormScaffold, Asset, Price, TAG_MAX_LENGTH, parse_tags},
    store::Store,
};

use super::{Upload, UploadValidator, ensure_owner};

/// Create, update, read, delete and search ads, and serve their pictures.
#[derive(Clone)]
pub struct AdService {
    store: Arc<dyn Store>,
    uploads: UploadValidator,
}

impl AdService {
    pub fn new(store: Arc<dyn Store>, uploads: UploadValidator) -> Self {
        Self { store, uploads }
    }

    pub fn form_scaffold(&self) -> AdFormScaffold {
        self.uploads.scaffold()
    }

    /// Validates the form and picture, then stores the ad for `owner_id`.
    pub async fn create(
        &self,
        owner_id: i64,
        form: AdForm,
        upload: Option<Upload>,
    ) -> Result<Ad, AppError> {
        let fields = clean_form(form)?;
        let picture = self.uploads.validate(upload)?;

        let ad = self
            .store
            .insert_ad(owner_id, fields, picture)
            .await
            .inspect_err(|e| tracing::error!("Failed to create ad: {:?}", e))?;

        tracing::info!(ad_id = ad.id, owner_id, "ad created");
        Ok(ad)
    }

    /// Owner-only. Without a new upload the stored picture is kept.
    pub async fn update(
        &self,
        ad_id: i64,
        caller_id: i64,
        form: AdForm,
        upload: Option<Upload>,
    ) -> Result<Ad, AppError> {
        let ad = self.read(ad_id).await?;
        ensure_owner(ad.owner_id, caller_id, "ad")?;

        let fields = clean_form(form)?;
        let picture = self.uploads.validate(upload)?;

        let ad = self
            .store
            .update_ad(ad_id, fields, picture)
            .await
            .inspect_err(|e| tracing::error!("Failed to update ad {}: {:?}", ad_id, e))?
            .ok_or_else(|| AppError::NotFound("Ad".to_string()))?;

        tracing::info!(ad_id, "ad updated");
        Ok(ad)
    }

    pub async fn read(&self, ad_id: i64) -> Result<Ad, AppError> {
        self.store
            .get_ad(ad_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ad".to_string()))
    }

    /// Owner-only. Comments and favorites of the ad go with it.
    pub async fn delete(&self, ad_id: i64, caller_id: i64) -> Result<(), AppError> {
        let ad = self.read(ad_id).await?;
        ensure_owner(ad.owner_id, caller_id, "ad")?;

        if !self.store.delete_ad(ad_id).await? {
            return Err(AppError::NotFound("Ad".to_string()));
        }

        tracing::info!(ad_id, "ad deleted");
        Ok(())
    }

    /// Case-insensitive substring match on title or text, or an exact tag
    /// match. A blank query lists every ad.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Ad>, AppError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(self.store.search_ads(query).await?)
    }

    pub async fn stream_asset(&self, ad_id: i64) -> Result<Asset, AppError> {
        self.store
            .fetch_asset(ad_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ad".to_string()))?
            .ok_or(AppError::NoAsset(ad_id))
    }
}

/// Trims the text fields, then validates every field.
/// Text is stored as submitted; escaping is left to whoever renders it.
fn clean_form(form: AdForm) -> Result<AdFields, AppError> {
    let form = AdForm {
        title: form.title.trim().to_string(),
        text: form.text.trim().to_string(),
        ..form
    };
    form.validate()?;

    let price = match form.price.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<Price>()
                .map_err(|e| AppError::validation("price", e.to_string()))?,
        ),
    };

    let tags = parse_tags(&form.tags);
    if tags.iter().any(|tag| tag.chars().count() > TAG_MAX_LENGTH) {
        return Err(AppError::validation(
            "tags",
            format!("Tags must be at most {TAG_MAX_LENGTH} characters"),
        ));
    }

    Ok(AdFields {
        title: form.title,
        price,
        text: form.text,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const OWNER: i64 = 1;
    const STRANGER: i64 = 2;

    fn service() -> AdService {
        AdService::new(Arc::new(MemoryStore::new()), UploadValidator::new(1024))
    }

    fn form(title: &str) -> AdForm {
        AdForm {
            title: title.to_string(),
            price: Some("10.50".to_string()),
            text: "Barely used".to_string(),
            tags: "bike, red".to_string(),
        }
    }

    fn png(len: usize) -> Upload {
        Upload {
            file_name: Some("bike.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: (0..len).map(|i| (i % 251) as u8).collect(),
        }
    }

    #[tokio::test]
    async fn create_then_stream_returns_identical_bytes() {
        let ads = service();
        let upload = png(600);
        let ad = ads.create(OWNER, form("Bike"), Some(upload.clone())).await.unwrap();

        assert_eq!(ad.owner_id, OWNER);
        assert_eq!(ad.tags, vec!["bike", "red"]);
        assert_eq!(ad.price.map(|p| p.cents()), Some(1050));
        assert_eq!(ad.picture.as_ref().map(|p| p.size), Some(600));

        let asset = ads.stream_asset(ad.id).await.unwrap();
        assert_eq!(asset.bytes, upload.bytes);
        assert_eq!(asset.content_type, "image/png");
    }

    #[tokio::test]
    async fn short_title_is_a_validation_error() {
        let ads = service();
        let err = ads.create(OWNER, form("B"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "title"));

        assert!(ads.create(OWNER, form("Bi"), None).await.is_ok());
    }

    #[tokio::test]
    async fn bad_price_is_a_validation_error() {
        let ads = service();
        let mut bad = form("Bike");
        bad.price = Some("12.345".to_string());
        let err = ads.create(OWNER, bad, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "price"));

        let mut blank = form("Bike");
        blank.price = Some("  ".to_string());
        assert!(ads.create(OWNER, blank, None).await.unwrap().price.is_none());
    }

    #[tokio::test]
    async fn oversized_picture_is_rejected_and_nothing_is_stored() {
        let ads = service();
        let err = ads.create(OWNER, form("Bike"), Some(png(1025))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "picture"));
        assert!(ads.search(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_without_upload_keeps_picture() {
        let ads = service();
        let upload = png(100);
        let ad = ads.create(OWNER, form("Bike"), Some(upload.clone())).await.unwrap();

        let mut changed = form("Blue bike");
        changed.tags = "blue".to_string();
        let updated = ads.update(ad.id, OWNER, changed, None).await.unwrap();

        assert_eq!(updated.title, "Blue bike");
        assert_eq!(updated.tags, vec!["blue"]);
        assert_eq!(updated.picture, ad.picture);
        assert_eq!(ads.stream_asset(ad.id).await.unwrap().bytes, upload.bytes);
    }

    #[tokio::test]
    async fn update_with_upload_replaces_picture() {
        let ads = service();
        let ad = ads.create(OWNER, form("Bike"), Some(png(100))).await.unwrap();

        let mut jpeg = png(50);
        jpeg.content_type = Some("image/jpeg".to_string());
        ads.update(ad.id, OWNER, form("Bike"), Some(jpeg.clone())).await.unwrap();

        let asset = ads.stream_asset(ad.id).await.unwrap();
        assert_eq!(asset.bytes, jpeg.bytes);
        assert_eq!(asset.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn only_owner_may_update_or_delete() {
        let ads = service();
        let ad = ads.create(OWNER, form("Bike"), None).await.unwrap();

        assert!(matches!(
            ads.update(ad.id, STRANGER, form("Mine now"), None).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ads.delete(ad.id, STRANGER).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(ads.read(ad.id).await.unwrap().title, "Bike");

        ads.delete(ad.id, OWNER).await.unwrap();
        assert!(matches!(ads.read(ad.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_ad_is_not_found() {
        let ads = service();
        assert!(matches!(ads.read(9).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            ads.update(9, OWNER, form("Bike"), None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(ads.delete(9, OWNER).await, Err(AppError::NotFound(_))));
        assert!(matches!(ads.stream_asset(9).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn ad_without_picture_has_no_asset() {
        let ads = service();
        let ad = ads.create(OWNER, form("Bike"), None).await.unwrap();
        assert!(ad.picture.is_none());
        assert!(matches!(
            ads.stream_asset(ad.id).await,
            Err(AppError::NoAsset(id)) if id == ad.id
        ));
    }

    #[tokio::test]
    async fn tag_match_returns_ad_once_even_when_title_matches_too() {
        let ads = service();
        let mut tagged = form("bike for sale");
        tagged.text = "a good bike".to_string();
        tagged.tags = "bike".to_string();
        let ad = ads.create(OWNER, tagged, None).await.unwrap();
        ads.create(OWNER, form("Sofa"), None).await.unwrap();

        let hits = ads.search(Some("bike")).await.unwrap();
        assert_eq!(hits.iter().filter(|a| a.id == ad.id).count(), 1);

        let mut only_tag = form("Lamp");
        only_tag.tags = "vintage".to_string();
        let lamp = ads.create(OWNER, only_tag, None).await.unwrap();
        let hits = ads.search(Some("vintage")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, lamp.id);
    }

    #[tokio::test]
    async fn blank_search_lists_everything() {
        let ads = service();
        ads.create(OWNER, form("Bike"), None).await.unwrap();
        ads.create(STRANGER, form("Sofa"), None).await.unwrap();

        assert_eq!(ads.search(None).await.unwrap().len(), 2);
        assert_eq!(ads.search(Some("   ")).await.unwrap().len(), 2);
        assert_eq!(ads.search(Some("SOFA")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn text_is_stored_as_submitted() {
        let ads = service();
        let mut cartoon = form("  Tom & Jerry ");
        cartoon.text = "x < y <b>bold</b>".to_string();
        let ad = ads.create(OWNER, cartoon, None).await.unwrap();

        assert_eq!(ad.title, "Tom & Jerry");
        assert_eq!(ad.text, "x < y <b>bold</b>");
        assert_eq!(ads.read(ad.id).await.unwrap().title, "Tom & Jerry");

        let hits = ads.search(Some("tom & jerry")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(ads.search(Some("x < y")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn title_length_counts_raw_characters() {
        let ads = service();
        let ad = ads.create(OWNER, form("<>"), None).await.unwrap();
        assert_eq!(ad.title, "<>");

        let err = ads.create(OWNER, form("&"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "title"));
    }
}
