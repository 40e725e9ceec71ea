//! Feed pagination types
//!
//! The feed is paged with an opaque cursor rather than page numbers: the
//! cursor is the position of the last served item in the merged ordering
//! `(published_at, external_id)` descending. Because the publish timestamp
//! alone is not unique, the cursor carries the video id as a tie-breaker,
//! so tied items are neither skipped nor re-served across a page boundary.

use serde::{Deserialize, Serialize};

use super::video::FeedItem;
use crate::error::Error;

/// Default page size for feed queries
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum allowed page size to prevent OOM
pub const MAX_PAGE_SIZE: u32 = 100;

/// Position of the last item of the previous page.
///
/// Rendered as `"<published_at>:<external_id>"`. A bare `"<published_at>"`
/// also parses (with `external_id = 0`), which reproduces the legacy strict
/// `published_at >= cursor` exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub published_at: i64,
    pub external_id: u64,
}

impl FeedCursor {
    #[must_use]
    pub const fn new(published_at: i64, external_id: u64) -> Self {
        Self {
            published_at,
            external_id,
        }
    }

    /// Whether an item at `(published_at, external_id)` comes strictly after
    /// this cursor in the descending feed order, i.e. belongs to a later page.
    #[must_use]
    pub const fn admits(&self, published_at: i64, external_id: u64) -> bool {
        published_at < self.published_at
            || (published_at == self.published_at && external_id < self.external_id)
    }
}

impl std::fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.published_at, self.external_id)
    }
}

impl std::str::FromStr for FeedCursor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts, id) = match s.split_once(':') {
            Some((ts, id)) => (ts, Some(id)),
            None => (s, None),
        };

        let published_at = ts
            .parse::<i64>()
            .map_err(|_| Error::InvalidCursor(s.to_string()))?;
        let external_id = match id {
            Some(id) => id
                .parse::<u64>()
                .map_err(|_| Error::InvalidCursor(s.to_string()))?,
            None => 0,
        };

        Ok(Self {
            published_at,
            external_id,
        })
    }
}

/// One page of the merged cross-creator feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub has_more: bool,
    /// Present only when `has_more` is true
    pub next_cursor: Option<FeedCursor>,
}

impl FeedPage {
    /// The valid terminal state for an empty creator set
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            next_cursor: None,
        }
    }

    /// Opaque token form of the next cursor, empty string when exhausted
    #[must_use]
    pub fn next_cursor_token(&self) -> String {
        self.next_cursor
            .map(|c| c.to_string())
            .unwrap_or_default()
    }
}
