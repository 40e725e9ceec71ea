//! Cross-creator feed aggregation
//!
//! One feed call fans out a cache-first snapshot resolution per followed
//! creator (bounded by a semaphore), then merges, sorts, cursors and
//! paginates the flattened result. A slow or failing creator delays the
//! call but never fails it.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::bilibili::client::VideoSource;
use crate::cache::{ArchiveCache, ArchiveSnapshot};
use crate::config::FeedConfig;
use crate::models::{CreatorId, FeedCursor, FeedItem, FeedPage, VideoSummary};
use crate::service::follow::FollowDirectory;

pub struct FeedService {
    cache: Arc<ArchiveCache>,
    source: Arc<dyn VideoSource>,
    follows: Arc<dyn FollowDirectory>,
    fanout: Arc<Semaphore>,
    config: FeedConfig,
}

impl FeedService {
    #[must_use]
    pub fn new(
        cache: Arc<ArchiveCache>,
        source: Arc<dyn VideoSource>,
        follows: Arc<dyn FollowDirectory>,
        config: FeedConfig,
    ) -> Self {
        let fanout = Arc::new(Semaphore::new(config.fanout_concurrency.max(1)));
        Self {
            cache,
            source,
            follows,
            fanout,
            config,
        }
    }

    /// One page of the merged feed for a user's followed creators.
    ///
    /// The result is a deterministic function of the cache/fetch snapshot
    /// taken during the call. `page_size` falls back to the configured
    /// default and is clamped to the configured maximum.
    pub async fn feed_page(
        &self,
        creators: &[CreatorId],
        cursor: Option<FeedCursor>,
        page_size: Option<u32>,
    ) -> FeedPage {
        // BTreeSet both deduplicates and fixes the resolution order
        let ids: BTreeSet<CreatorId> = creators.iter().copied().collect();
        if ids.is_empty() {
            return FeedPage::empty();
        }

        let page_size = page_size
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size) as usize;

        // Resolve every creator concurrently and wait for all of them;
        // individual failures resolve to nothing instead of aborting.
        let resolutions = join_all(ids.iter().map(|&id| self.resolve_snapshot(id))).await;

        let resolved = resolutions.into_iter().flatten().collect::<Vec<_>>();
        debug!(
            resolved = resolved.len(),
            requested = ids.len(),
            "feed fan-out complete"
        );

        let mut flattened: Vec<(CreatorId, VideoSummary)> = Vec::new();
        for (creator, videos) in &resolved {
            for video in videos.iter() {
                flattened.push((*creator, video.clone()));
            }
        }

        // Newest first; the video id breaks publish-time ties so the cursor
        // position is unambiguous
        flattened.sort_by(|a, b| {
            b.1.published_at
                .cmp(&a.1.published_at)
                .then(b.1.external_id.cmp(&a.1.external_id))
        });

        if let Some(cursor) = cursor {
            flattened.retain(|(_, video)| cursor.admits(video.published_at, video.external_id));
        }
        flattened.truncate(page_size);

        let has_more = flattened.len() == page_size;
        let next_cursor = if has_more {
            flattened
                .last()
                .map(|(_, video)| FeedCursor::new(video.published_at, video.external_id))
        } else {
            None
        };

        let owners: Vec<CreatorId> = flattened
            .iter()
            .map(|(creator, _)| *creator)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles = self.follows.creator_profiles(&owners).await;

        let items = flattened
            .into_iter()
            .map(|(creator_id, video)| {
                let profile = profiles.get(&creator_id);
                FeedItem {
                    video,
                    creator_id,
                    creator_name: profile
                        .map(|p| p.display_name.clone())
                        .unwrap_or_default(),
                    creator_avatar: profile.map(|p| p.avatar_url.clone()).unwrap_or_default(),
                }
            })
            .collect();

        FeedPage {
            items,
            has_more,
            next_cursor,
        }
    }

    /// Cache-first resolution of one creator's video list.
    ///
    /// Holds a fan-out permit for the duration so no more than the
    /// configured number of resolutions (and therefore upstream fetches)
    /// are in flight at once. A live fetch writes back to the cache, empty
    /// results included, so quiet creators are not refetched every call.
    /// On fetch failure a stale snapshot, when present, is served instead.
    async fn resolve_snapshot(
        &self,
        creator: CreatorId,
    ) -> Option<(CreatorId, Arc<Vec<VideoSummary>>)> {
        let Ok(_permit) = self.fanout.acquire().await else {
            return None;
        };

        let cached = self.cache.get(creator);
        if let Some(snapshot) = &cached {
            if self.cache.is_fresh(snapshot) {
                return Some((creator, Arc::clone(&snapshot.videos)));
            }
        }

        match self.source.recent_videos(creator).await {
            Ok(videos) => {
                let snapshot = ArchiveSnapshot::new(creator, videos);
                let videos = Arc::clone(&snapshot.videos);
                self.cache.insert(snapshot);
                Some((creator, videos))
            }
            Err(err) => {
                warn!(creator_id = %creator, error = %err, "archive fetch failed, serving stale if available");
                cached.map(|snapshot| (creator, snapshot.videos))
            }
        }
    }
}
