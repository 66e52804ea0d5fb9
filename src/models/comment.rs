use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const COMMENT_MIN_LENGTH: u64 = 3;
pub const COMMENT_MAX_LENGTH: u64 = 500;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub ad_id: i64,
    pub owner_id: i64,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(length(
        min = COMMENT_MIN_LENGTH,
        max = COMMENT_MAX_LENGTH,
        message = "Comment must be between 3 and 500 characters"
    ))]
    pub comment: String,
}

/// A validated comment ready to be stored.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub ad_id: i64,
    pub owner_id: i64,
    pub text: String,
}

/// Empty comment-entry form sent along with an ad's detail view.
#[derive(Debug, Serialize)]
pub struct CommentFormScaffold {
    pub comment: String,
    pub min_length: u64,
    pub max_length: u64,
}

impl Default for CommentFormScaffold {
    fn default() -> Self {
        Self {
            comment: String::new(),
            min_length: COMMENT_MIN_LENGTH,
            max_length: COMMENT_MAX_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_of_len(len: u64) -> CommentForm {
        CommentForm {
            comment: "é".repeat(len as usize),
        }
    }

    #[test]
    fn length_bounds_follow_the_constants() {
        assert!(form_of_len(COMMENT_MIN_LENGTH - 1).validate().is_err());
        assert!(form_of_len(COMMENT_MIN_LENGTH).validate().is_ok());
        assert!(form_of_len(COMMENT_MAX_LENGTH).validate().is_ok());
        assert!(form_of_len(COMMENT_MAX_LENGTH + 1).validate().is_err());
    }
}
