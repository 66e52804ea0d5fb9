use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

use super::comment::{Comment, CommentFormScaffold};

/// Longest accepted tag label.
pub const TAG_MAX_LENGTH: usize = 100;

/// An ad as read back from the store.
///
/// The picture bytes are not part of this struct; they are loaded on their
/// own through `Store::fetch_asset` so listings never pull blobs.
#[derive(Debug, Clone, Serialize)]
pub struct Ad {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub price: Option<Price>,
    pub text: String,
    /// Present iff the ad carries a picture.
    pub picture: Option<PictureInfo>,
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Metadata of a stored picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureInfo {
    pub content_type: String,
    pub size: u64,
}

/// A picture together with its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Asset {
    pub fn info(&self) -> PictureInfo {
        PictureInfo {
            content_type: self.content_type.clone(),
            size: self.bytes.len() as u64,
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// A price with two decimal places, held as a whole number of cents.
///
/// At most five integer digits are accepted, so the largest price is 99999.99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(i64);

static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-)?(\d{1,5})(?:\.(\d{1,2}))?$").expect("price pattern is valid")
});

impl Price {
    pub const fn from_cents(cents: i64) -> Self {
        Price(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPrice;

impl fmt::Display for InvalidPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Enter a number with at most 5 digits before and 2 after the decimal point")
    }
}

impl FromStr for Price {
    type Err = InvalidPrice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PRICE_PATTERN.captures(s.trim()).ok_or(InvalidPrice)?;

        let whole: i64 = caps[2].parse().map_err(|_| InvalidPrice)?;
        let fraction = match caps.get(3) {
            Some(m) if m.as_str().len() == 1 => m.as_str().parse::<i64>().map_err(|_| InvalidPrice)? * 10,
            Some(m) => m.as_str().parse::<i64>().map_err(|_| InvalidPrice)?,
            None => 0,
        };

        let cents = whole * 100 + fraction;
        Ok(Price(if caps.get(1).is_some() { -cents } else { cents }))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Raw create/update form as submitted by the client.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct AdForm {
    #[validate(length(
        min = 2,
        max = 200,
        message = "Title must be between 2 and 200 characters"
    ))]
    pub title: String,

    /// Decimal string such as "12.50"; blank means no price.
    pub price: Option<String>,

    pub text: String,

    /// Comma-separated list of tags.
    pub tags: String,
}

/// Cleaned ad fields, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdFields {
    pub title: String,
    pub price: Option<Price>,
    pub text: String,
    pub tags: Vec<String>,
}

/// Splits a tag input into labels.
///
/// Commas separate labels when any comma is present; otherwise whitespace
/// does. Labels are trimmed, blanks dropped, duplicates removed and the
/// result sorted.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = if input.contains(',') {
        input.split(',').map(str::trim).map(str::to_string).collect()
    } else {
        input.split_whitespace().map(str::to_string).collect()
    };

    tags.retain(|tag| !tag.is_empty());
    tags.sort();
    tags.dedup();
    tags
}

/// Upload-form metadata shown next to the picture field.
#[derive(Debug, Serialize)]
pub struct AdFormScaffold {
    pub max_upload_limit: usize,
    pub max_upload_limit_text: String,
    pub picture_label: String,
}

/// Query parameters for listing ads.
#[derive(Debug, Deserialize)]
pub struct AdListParams {
    /// Matched against title, text and tag labels.
    pub search: Option<String>,
}

/// Ads plus the ids among them the caller has favorited.
#[derive(Debug, Serialize)]
pub struct AdListResponse {
    pub ads: Vec<Ad>,
    pub favorites: Vec<i64>,
    pub search: Option<String>,
}

/// One ad with its comments and an empty comment form.
#[derive(Debug, Serialize)]
pub struct AdDetailResponse {
    pub ad: Ad,
    pub favorites_count: i64,
    pub comments: Vec<Comment>,
    pub comment_form: CommentFormScaffold,
}
