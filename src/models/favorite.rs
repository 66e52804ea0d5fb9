use serde::Serialize;

/// A user's bookmark of an ad. At most one exists per (ad, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Favorite {
    pub ad_id: i64,
    pub user_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
