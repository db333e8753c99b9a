//! Scraped Instagram profile records and username matching.

use serde::{Deserialize, Serialize};
use instadiag_core::{Error, NotFoundReason};

/// One profile as returned by the scraper.
///
/// Only the attributes the diagnosis uses are modelled; everything else in
/// the provider payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub followers_count: Option<i64>,
    pub follows_count: Option<i64>,
    pub latest_posts: Option<Vec<Post>>,
    /// Set by the scraper when it could not fetch this profile.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl ProfileRecord {
    /// Most recent posts, newest first as delivered.
    pub fn posts(&self) -> &[Post] {
        self.latest_posts.as_deref().unwrap_or(&[])
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Best available description of a scraper error.
    pub fn error_text(&self) -> Option<&str> {
        non_blank(self.error_description.as_deref()).or(non_blank(self.error.as_deref()))
    }

    /// Whether this record belongs to `handle` (case-insensitive, `@` ignored).
    pub fn matches(&self, handle: &str) -> bool {
        self.username
            .as_deref()
            .map(|u| u.trim().trim_start_matches('@'))
            .is_some_and(|u| !u.is_empty() && u.eq_ignore_ascii_case(handle.trim_start_matches('@')))
    }
}

/// One entry of the profile's `latestPosts`.
///
/// The scraper has used more than one name for several counters over time;
/// both spellings are kept and read through the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub caption: Option<String>,
    pub text: Option<String>,
    pub likes_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comments_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub is_video: Option<bool>,
    pub video_view_count: Option<i64>,
    pub view_count: Option<i64>,
}

/// Kind of post, inferred from the type field and video flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Feed,
    Reel,
    Carousel,
}

impl Post {
    pub fn likes(&self) -> i64 {
        first_nonzero(self.likes_count, self.like_count).unwrap_or(0)
    }

    pub fn comments(&self) -> i64 {
        first_nonzero(self.comments_count, self.comment_count).unwrap_or(0)
    }

    /// View count, if the post reports a non-zero one.
    pub fn views(&self) -> Option<i64> {
        first_nonzero(self.video_view_count, self.view_count)
    }

    pub fn caption_text(&self) -> &str {
        non_blank(self.caption.as_deref())
            .or(non_blank(self.text.as_deref()))
            .unwrap_or("")
    }

    pub fn kind(&self) -> PostKind {
        match self.post_type.as_deref() {
            _ if self.is_video == Some(true) => PostKind::Reel,
            Some("Video") => PostKind::Reel,
            Some("Sidecar") | Some("Carousel") => PostKind::Carousel,
            _ => PostKind::Feed,
        }
    }
}

fn first_nonzero(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    a.filter(|n| *n != 0).or(b.filter(|n| *n != 0))
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// A raw dataset item: either a profile, or an array whose first element is
/// the profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DatasetItem {
    Nested(Vec<ProfileRecord>),
    Record(ProfileRecord),
}

impl DatasetItem {
    pub fn into_record(self) -> Option<ProfileRecord> {
        match self {
            DatasetItem::Record(r) => Some(r),
            DatasetItem::Nested(v) => v.into_iter().next(),
        }
    }
}

/// Convert raw dataset items into profile records one at a time.
///
/// An item that does not fit the record shape is dropped so that the other
/// profiles in the same run stay usable.
pub fn parse_dataset(items: Vec<serde_json::Value>) -> Vec<ProfileRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<DatasetItem>(value) {
            Ok(item) => item.into_record(),
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping malformed dataset item");
                None
            }
        })
        .collect()
}

/// Records resolved for one diagnosis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMatch {
    pub target: ProfileRecord,
    pub competitor: Option<ProfileRecord>,
}

/// Assign scraped records to the requested handles.
///
/// Records flagged with an error never match. When the target is missing,
/// the error text of the target's own error record (or else the first error
/// record) decides the not-found reason.
///
/// # Errors
///
/// Returns `Error::AccountNotFound` if no usable record matches `target`.
pub fn match_profiles(
    records: Vec<ProfileRecord>, target: &str, competitor: Option<&str>,
) -> Result<ProfileMatch, Error> {
    let mut target_record = None;
    let mut competitor_record = None;
    let mut target_error: Option<String> = None;
    let mut first_error: Option<String> = None;

    for record in records {
        if record.is_error() {
            let text = record.error_text().unwrap_or("unknown error").to_string();
            tracing::debug!(username = ?record.username, error = %text, "skipping scraper error record");
            if target_error.is_none() && record.matches(target) {
                target_error = Some(text.clone());
            }
            first_error.get_or_insert(text);
            continue;
        }

        if target_record.is_none() && record.matches(target) {
            target_record = Some(record);
        } else if competitor_record.is_none() && competitor.is_some_and(|c| record.matches(c)) {
            competitor_record = Some(record);
        }
    }

    match target_record {
        Some(target) => Ok(ProfileMatch { target, competitor: competitor_record }),
        None => {
            let (reason, detail) = match target_error.or(first_error) {
                Some(text) => (NotFoundReason::from_description(&text), text),
                None => (NotFoundReason::Unknown, "no profile data returned".to_string()),
            };
            Err(Error::AccountNotFound { reason, detail })
        }
    }
}
