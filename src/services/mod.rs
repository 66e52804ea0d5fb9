// src/services/mod.rs

pub mod ads;
pub mod comments;
pub mod favorites;
pub mod upload;

pub use ads::AdService;
pub use comments::CommentService;
pub use favorites::FavoriteService;
pub use upload::{Upload, UploadValidator};

use crate::error::AppError;

/// Only the owner of a resource may change or delete it.
fn ensure_owner(owner_id: i64, caller_id: i64, resource: &str) -> Result<(), AppError> {
    if owner_id != caller_id {
        return Err(AppError::Forbidden(format!(
            "You are not the owner of this {resource}"
        )));
    }
    Ok(())
}
