//! Background archive refresher
//!
//! A single periodic task that sweeps every creator anyone follows and
//! refetches entries older than half the TTL, so feed calls are usually
//! served from warm cache. Exactly one sweep runs at a time; upstream calls
//! within a sweep are spaced by a fixed delay to bound the request rate.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bilibili::client::VideoSource;
use crate::cache::{ArchiveCache, ArchiveSnapshot};
use crate::service::follow::FollowDirectory;

pub struct ArchiveRefresher {
    cache: Arc<ArchiveCache>,
    source: Arc<dyn VideoSource>,
    follows: Arc<dyn FollowDirectory>,
    interval: Duration,
    fetch_delay: Duration,
    cancel_token: CancellationToken,
}

impl ArchiveRefresher {
    #[must_use]
    pub fn new(
        cache: Arc<ArchiveCache>,
        source: Arc<dyn VideoSource>,
        follows: Arc<dyn FollowDirectory>,
        interval: Duration,
        fetch_delay: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            follows,
            interval,
            fetch_delay,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Start the refresh loop: one sweep immediately, then one per interval.
    ///
    /// Returns the `JoinHandle` so the caller can detect panics or task
    /// completion. Use [`shutdown`](Self::shutdown) to stop the loop.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let source = Arc::clone(&self.source);
        let follows = Arc::clone(&self.follows);
        let fetch_delay = self.fetch_delay;
        let cancel_token = self.cancel_token.clone();

        let mut timer = interval(self.interval);
        // A sweep longer than the interval must not cause a burst of
        // catch-up sweeps afterwards
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => {
                        info!("archive refresher shutting down");
                        break;
                    }
                    _ = timer.tick() => {
                        Self::sweep(&cache, source.as_ref(), follows.as_ref(), fetch_delay, &cancel_token).await;
                    }
                }
            }
        })
    }

    /// Request a graceful stop; takes effect between upstream calls.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// One sweep over the distinct followed-creator set, in ascending id
    /// order. A failed fetch is logged and the sweep moves on; there is no
    /// retry until the next cycle.
    async fn sweep(
        cache: &ArchiveCache,
        source: &dyn VideoSource,
        follows: &dyn FollowDirectory,
        fetch_delay: Duration,
        cancel_token: &CancellationToken,
    ) {
        let mut creators = follows.followed_creators().await;
        if creators.is_empty() {
            return;
        }
        creators.sort_unstable();
        creators.dedup();

        info!(creators = creators.len(), "archive refresh sweep starting");
        let mut fetched = 0usize;

        for creator in creators {
            if cancel_token.is_cancelled() {
                break;
            }

            if let Some(snapshot) = cache.get(creator) {
                if !cache.needs_refresh(&snapshot) {
                    continue;
                }
            }

            match source.recent_videos(creator).await {
                Ok(videos) => {
                    cache.insert(ArchiveSnapshot::new(creator, videos));
                    fetched += 1;
                }
                Err(err) => {
                    warn!(creator_id = %creator, error = %err, "archive refresh fetch failed");
                }
            }

            tokio::time::sleep(fetch_delay).await;
        }

        info!(fetched, "archive refresh sweep done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilibili::BilibiliError;
    use crate::models::{CreatorId, VideoSummary};
    use crate::service::follow::StaticFollowDirectory;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

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

    #[derive(Default)]
    struct RecordingSource {
        videos: HashMap<CreatorId, Vec<VideoSummary>>,
        fail: HashSet<CreatorId>,
        calls: Mutex<Vec<(CreatorId, tokio::time::Instant)>>,
    }

    impl RecordingSource {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl VideoSource for RecordingSource {
        async fn recent_videos(
            &self,
            creator: CreatorId,
        ) -> Result<Vec<VideoSummary>, BilibiliError> {
            self.calls
                .lock()
                .unwrap()
                .push((creator, tokio::time::Instant::now()));
            if self.fail.contains(&creator) {
                return Err(BilibiliError::Network("connection reset".to_string()));
            }
            Ok(self.videos.get(&creator).cloned().unwrap_or_default())
        }
    }

    fn cache_with_ttl(secs: u64) -> Arc<ArchiveCache> {
        Arc::new(ArchiveCache::new(Duration::from_secs(secs)))
    }

    fn ids(range: std::ops::RangeInclusive<u64>) -> Arc<StaticFollowDirectory> {
        Arc::new(StaticFollowDirectory::from_ids(range.map(CreatorId)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_rate_limited() {
        let cache = cache_with_ttl(3600);
        let source = RecordingSource::default();
        let follows = ids(1..=3);
        let cancel = CancellationToken::new();

        ArchiveRefresher::sweep(
            &cache,
            &source,
            follows.as_ref(),
            Duration::from_millis(500),
            &cancel,
        )
        .await;

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            let gap = pair[1].1.duration_since(pair[0].1);
            assert!(gap >= Duration::from_millis(500), "gap was {gap:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_visits_creators_in_ascending_order() {
        let cache = cache_with_ttl(3600);
        let source = RecordingSource::default();
        let follows = ids(1..=4);
        let cancel = CancellationToken::new();

        ArchiveRefresher::sweep(&cache, &source, follows.as_ref(), Duration::ZERO, &cancel)
            .await;

        let visited: Vec<CreatorId> =
            source.calls.lock().unwrap().iter().map(|c| c.0).collect();
        assert_eq!(visited, (1..=4).map(CreatorId).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_skips_entries_fresher_than_half_ttl() {
        let cache = cache_with_ttl(2400);
        // Creator 1 refreshed just now, creator 2 past the TTL/2 threshold
        cache.insert(ArchiveSnapshot::new(CreatorId(1), vec![video(11, 100)]));
        cache.insert(ArchiveSnapshot::with_fetched_at(
            CreatorId(2),
            vec![video(21, 90)],
            Utc::now() - chrono::Duration::seconds(1800),
        ));

        let source = RecordingSource {
            videos: HashMap::from([(CreatorId(2), vec![video(22, 95)])]),
            ..RecordingSource::default()
        };
        let follows = ids(1..=2);
        let cancel = CancellationToken::new();

        ArchiveRefresher::sweep(&cache, &source, follows.as_ref(), Duration::ZERO, &cancel)
            .await;

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, CreatorId(2));

        let refreshed = cache.get(CreatorId(2)).unwrap();
        assert_eq!(refreshed.videos[0].external_id, 22);
        // Creator 1's entry untouched
        assert_eq!(cache.get(CreatorId(1)).unwrap().videos[0].external_id, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_does_not_abort_sweep() {
        let cache = cache_with_ttl(3600);
        let source = RecordingSource {
            videos: HashMap::from([(CreatorId(3), vec![video(31, 100)])]),
            fail: HashSet::from([CreatorId(1)]),
            ..RecordingSource::default()
        };
        let follows = ids(1..=3);
        let cancel = CancellationToken::new();

        ArchiveRefresher::sweep(&cache, &source, follows.as_ref(), Duration::ZERO, &cancel)
            .await;

        assert_eq!(source.call_count(), 3);
        assert!(cache.get(CreatorId(1)).is_none());
        assert!(cache.get(CreatorId(3)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_follow_set_does_nothing() {
        let cache = cache_with_ttl(3600);
        let source = RecordingSource::default();
        let follows = Arc::new(StaticFollowDirectory::default());
        let cancel = CancellationToken::new();

        ArchiveRefresher::sweep(&cache, &source, follows.as_ref(), Duration::ZERO, &cancel)
            .await;

        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_sweeps_immediately_then_periodically() {
        let cache = cache_with_ttl(3600);
        // Always-failing source: nothing gets cached, so every cycle
        // attempts every creator again
        let source = Arc::new(RecordingSource {
            fail: HashSet::from([CreatorId(1)]),
            ..RecordingSource::default()
        });
        let refresher = ArchiveRefresher::new(
            cache,
            Arc::clone(&source) as Arc<dyn VideoSource>,
            ids(1..=1),
            Duration::from_secs(60),
            Duration::ZERO,
        );

        let handle = refresher.start();

        // First sweep fires on startup, not after the first interval
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.call_count(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.call_count(), 2);

        refresher.shutdown();
        handle.await.unwrap();
    }
}
