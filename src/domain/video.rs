use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The external video record the Healer patches.
/// Read-mostly from the core's perspective; the Healer mutates exactly
/// `status` and `video_v2`, and only when its preconditions hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoRecord {
    pub owner: String,
    pub permlink: String,
    pub status: String,
    #[serde(default)]
    pub video_v2: Option<String>,
    pub created: DateTime<Utc>,
}

impl VideoRecord {
    pub const STATUS_PUBLISHED: &'static str = "published";

    /// True iff this record is a candidate for healing: published, recent,
    /// and missing its `video_v2` derivation.
    pub fn needs_healing(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == Self::STATUS_PUBLISHED
            && now - self.created <= window
            && self.video_v2.as_deref().unwrap_or("").is_empty()
    }
}
