use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{error::AppError, services::FavoriteService, utils::jwt::Claims};

/// Favorite an ad. Repeating the call changes nothing.
pub async fn add_favorite(
    State(favorites): State<FavoriteService>,
    Extension(claims): Extension<Claims>,
    Path(ad_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    favorites.add(claims.user_id()?, ad_id).await?;

    Ok(StatusCode::OK)
}

/// Un-favorite an ad. Succeeds even if it was never favorited.
pub async fn remove_favorite(
    State(favorites): State<FavoriteService>,
    Extension(claims): Extension<Claims>,
    Path(ad_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    favorites.remove(claims.user_id()?, ad_id).await?;

    Ok(StatusCode::OK)
}
