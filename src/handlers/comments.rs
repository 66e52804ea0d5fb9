use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError, models::comment::CommentForm, services::CommentService, utils::jwt::Claims,
};

/// Create a new comment on an ad.
pub async fn create_comment(
    State(comments): State<CommentService>,
    Extension(claims): Extension<Claims>,
    Path(ad_id): Path<i64>,
    Json(payload): Json<CommentForm>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments.create(ad_id, claims.user_id()?, payload).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Delete a comment.
/// Requires: Login + Author.
pub async fn delete_comment(
    State(comments): State<CommentService>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    comments.delete(id, claims.user_id()?).await?;

    Ok(StatusCode::NO_CONTENT)
}
