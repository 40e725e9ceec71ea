use serde::{Deserialize, Serialize};

use super::id::CreatorId;

/// Video ID as accepted by the metadata view endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoId {
    Aid(u64),
    Bvid(String),
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aid(aid) => write!(f, "av{aid}"),
            Self::Bvid(bvid) => write!(f, "{bvid}"),
        }
    }
}

/// Lightweight metadata for one published video, in upstream archive order.
///
/// Immutable once constructed; snapshots replace whole lists, never items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    /// Numeric video id (aid)
    pub external_id: u64,
    /// Short alphanumeric alias (bvid)
    pub public_id: String,
    pub title: String,
    pub cover_url: String,
    pub duration_seconds: u64,
    /// Publish time, unix seconds
    pub published_at: i64,
    pub play_count: u64,
    pub comment_count: u64,
}

/// Full metadata for a single video, from the view endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub external_id: u64,
    pub public_id: String,
    pub title: String,
    pub cover_url: String,
    pub duration_seconds: u64,
    pub published_at: i64,
    /// Absent for placeholder entries (deleted/unavailable videos)
    pub owner: Option<CreatorProfile>,
}

/// Display data for a creator, joined from the follow directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub creator_id: CreatorId,
    pub display_name: String,
    pub avatar_url: String,
}

/// One entry of a merged cross-creator feed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub video: VideoSummary,
    pub creator_id: CreatorId,
    /// Empty when the follow directory has no profile for the creator
    pub creator_name: String,
    pub creator_avatar: String,
}
