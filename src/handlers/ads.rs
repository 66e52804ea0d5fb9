use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        ad::{AdDetailResponse, AdForm, AdListParams, AdListResponse},
        comment::CommentFormScaffold,
    },
    services::{
        AdService, CommentService, FavoriteService, Upload, upload::PICTURE_FIELD,
    },
    utils::jwt::Claims,
};

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

/// Reads the create/update form. Unknown fields are ignored.
async fn read_ad_form(mut multipart: Multipart) -> Result<(AdForm, Option<Upload>), AppError> {
    let mut form = AdForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            PICTURE_FIELD => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "title" => form.title = field.text().await.map_err(multipart_error)?,
            "price" => form.price = Some(field.text().await.map_err(multipart_error)?),
            "text" => form.text = field.text().await.map_err(multipart_error)?,
            "tags" => form.tags = field.text().await.map_err(multipart_error)?,
            other => tracing::debug!("Ignoring unknown form field {:?}", other),
        }
    }

    Ok((form, upload))
}

/// List ads, optionally filtered by `?search=`.
/// Marks which of them the caller (if logged in) has favorited.
pub async fn list_ads(
    State(ads): State<AdService>,
    State(favorites): State<FavoriteService>,
    claims: Option<Extension<Claims>>,
    Query(params): Query<AdListParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = match claims {
        Some(Extension(claims)) => Some(claims.user_id()?),
        None => None,
    };

    let ad_list = ads.search(params.search.as_deref()).await?;

    let mut favorite_ids: Vec<i64> = favorites
        .list_favorite_ad_ids(user_id)
        .await?
        .into_iter()
        .collect();
    favorite_ids.sort_unstable();

    Ok(Json(AdListResponse {
        ads: ad_list,
        favorites: favorite_ids,
        search: params.search,
    }))
}

/// Upload limits for the create/update form.
pub async fn form_scaffold(State(ads): State<AdService>) -> impl IntoResponse {
    Json(ads.form_scaffold())
}

/// Create a new ad owned by the caller.
pub async fn create_ad(
    State(ads): State<AdService>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.user_id()?;
    let (form, upload) = read_ad_form(multipart).await?;

    let ad = ads.create(owner_id, form, upload).await?;

    Ok((StatusCode::CREATED, Json(ad)))
}

/// Get a single ad with its comments.
pub async fn get_ad(
    State(ads): State<AdService>,
    State(comments): State<CommentService>,
    State(favorites): State<FavoriteService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ad = ads.read(id).await?;
    let comments = comments.list(id).await?;
    let favorites_count = favorites.count(id).await?;

    Ok(Json(AdDetailResponse {
        ad,
        favorites_count,
        comments,
        comment_form: CommentFormScaffold::default(),
    }))
}

/// Update an ad.
/// Requires: Login + Owner. A missing picture part keeps the current picture.
pub async fn update_ad(
    State(ads): State<AdService>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let caller_id = claims.user_id()?;
    let (form, upload) = read_ad_form(multipart).await?;

    let ad = ads.update(id, caller_id, form, upload).await?;

    Ok(Json(ad))
}

/// Delete an ad together with its comments and favorites.
/// Requires: Login + Owner.
pub async fn delete_ad(
    State(ads): State<AdService>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ads.delete(id, claims.user_id()?).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Serve the raw picture bytes of an ad.
pub async fn stream_picture(
    State(ads): State<AdService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let asset = ads.stream_asset(id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::CONTENT_LENGTH, asset.bytes.len().to_string()),
        ],
        asset.bytes,
    ))
}
