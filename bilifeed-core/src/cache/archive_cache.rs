//! Per-creator archive cache
//!
//! In-memory TTL-bounded store of the most recent video-list snapshot per
//! creator. Freshness is a caller-side policy decision: `get` never consults
//! the clock, and there is no eviction — a stale entry stays readable until
//! the next `insert` overwrites it, so a failed refresh still serves
//! slightly-stale data instead of nothing.
//!
//! Shared between the feed aggregator and the background refresher;
//! per-entry replacement is atomic and last-writer-wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::models::{CreatorId, VideoSummary};

/// One creator's video-list snapshot, replaced wholesale on every store.
///
/// The video list keeps the upstream order (descending publish time); the
/// cache never re-sorts it.
#[derive(Debug, Clone)]
pub struct ArchiveSnapshot {
    pub creator_id: CreatorId,
    pub videos: Arc<Vec<VideoSummary>>,
    pub fetched_at: DateTime<Utc>,
}

impl ArchiveSnapshot {
    #[must_use]
    pub fn new(creator_id: CreatorId, videos: Vec<VideoSummary>) -> Self {
        Self {
            creator_id,
            videos: Arc::new(videos),
            fetched_at: Utc::now(),
        }
    }

    /// Snapshot with an explicit fetch time (tests backdate entries with this)
    #[must_use]
    pub fn with_fetched_at(
        creator_id: CreatorId,
        videos: Vec<VideoSummary>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            creator_id,
            videos: Arc::new(videos),
            fetched_at,
        }
    }
}

/// TTL-bounded map of creator id → latest archive snapshot
pub struct ArchiveCache {
    entries: DashMap<CreatorId, ArchiveSnapshot>,
    ttl: chrono::Duration,
}

impl ArchiveCache {
    /// # Panics
    /// Panics if `ttl` exceeds the chrono duration range (millions of years).
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).expect("archive TTL out of range"),
        }
    }

    /// Stored snapshot for a creator, regardless of freshness
    #[must_use]
    pub fn get(&self, creator: CreatorId) -> Option<ArchiveSnapshot> {
        self.entries.get(&creator).map(|entry| entry.clone())
    }

    /// Atomically replace the snapshot for the snapshot's creator
    pub fn insert(&self, snapshot: ArchiveSnapshot) {
        self.entries.insert(snapshot.creator_id, snapshot);
    }

    /// Whether the snapshot is within the freshness window
    #[must_use]
    pub fn is_fresh(&self, snapshot: &ArchiveSnapshot) -> bool {
        Utc::now().signed_duration_since(snapshot.fetched_at) < self.ttl
    }

    /// Whether the background sweep should refetch this snapshot
    /// (older than half the TTL)
    #[must_use]
    pub fn needs_refresh(&self, snapshot: &ArchiveSnapshot) -> bool {
        Utc::now().signed_duration_since(snapshot.fetched_at) >= self.ttl / 2
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(external_id: u64, published_at: i64) -> VideoSummary {
        VideoSummary {
            external_id,
            public_id: format!("BV{external_id}"),
            title: "title".to_string(),
            cover_url: String::new(),
            duration_seconds: 60,
            published_at,
            play_count: 0,
            comment_count: 0,
        }
    }

    #[test]
    fn test_get_before_put_reports_not_found() {
        let cache = ArchiveCache::new(Duration::from_secs(3600));
        assert!(cache.get(CreatorId(1)).is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_put_then_get_returns_stored_entry() {
        let cache = ArchiveCache::new(Duration::from_secs(3600));
        let snapshot = ArchiveSnapshot::new(CreatorId(1), vec![video(10, 100), video(11, 90)]);
        cache.insert(snapshot.clone());

        let stored = cache.get(CreatorId(1)).unwrap();
        assert_eq!(stored.creator_id, CreatorId(1));
        assert_eq!(*stored.videos, *snapshot.videos);
        assert!(cache.is_fresh(&stored));
        assert!(!cache.needs_refresh(&stored));
    }

    #[test]
    fn test_stale_entry_remains_readable() {
        let cache = ArchiveCache::new(Duration::from_secs(3600));
        let stale = ArchiveSnapshot::with_fetched_at(
            CreatorId(1),
            vec![video(10, 100)],
            Utc::now() - chrono::Duration::seconds(7200),
        );
        cache.insert(stale);

        // No eviction: the entry is still there, just reported as not fresh
        let stored = cache.get(CreatorId(1)).unwrap();
        assert!(!cache.is_fresh(&stored));
        assert!(cache.needs_refresh(&stored));
    }

    #[test]
    fn test_half_ttl_refresh_threshold() {
        let cache = ArchiveCache::new(Duration::from_secs(3600));

        let young = ArchiveSnapshot::with_fetched_at(
            CreatorId(1),
            vec![],
            Utc::now() - chrono::Duration::seconds(600),
        );
        assert!(cache.is_fresh(&young));
        assert!(!cache.needs_refresh(&young));

        // Past TTL/2 but inside TTL: fresh for readers, due for the sweep
        let middle_aged = ArchiveSnapshot::with_fetched_at(
            CreatorId(2),
            vec![],
            Utc::now() - chrono::Duration::seconds(2400),
        );
        assert!(cache.is_fresh(&middle_aged));
        assert!(cache.needs_refresh(&middle_aged));
    }

    #[test]
    fn test_insert_replaces_wholesale() {
        let cache = ArchiveCache::new(Duration::from_secs(3600));
        cache.insert(ArchiveSnapshot::new(CreatorId(1), vec![video(10, 100)]));
        cache.insert(ArchiveSnapshot::new(CreatorId(1), vec![video(11, 90)]));

        let stored = cache.get(CreatorId(1)).unwrap();
        assert_eq!(stored.videos.len(), 1);
        assert_eq!(stored.videos[0].external_id, 11);
        assert_eq!(cache.entry_count(), 1);
    }
}
