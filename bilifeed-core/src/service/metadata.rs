//! Single-video metadata lookup
//!
//! Smaller sibling of the archive cache used for enriching individual
//! videos (watch history, favorites rendering). Unlike the archive store
//! this cache may evict, so it is a plain TTL+capacity moka cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::bilibili::{ArchiveClient, BilibiliError};
use crate::config::CacheConfig;
use crate::models::{VideoId, VideoMetadata};

/// Title served for deleted or unavailable videos
const UNAVAILABLE_TITLE: &str = "已失效视频";

pub struct VideoMetadataService {
    client: Arc<ArchiveClient>,
    cache: moka::future::Cache<String, VideoMetadata>,
}

impl VideoMetadataService {
    #[must_use]
    pub fn new(client: Arc<ArchiveClient>, config: &CacheConfig) -> Self {
        let cache = moka::future::CacheBuilder::new(config.metadata_max_capacity)
            .time_to_live(Duration::from_secs(config.metadata_ttl_hours * 3600))
            .build();
        Self { client, cache }
    }

    /// Metadata for one video, cache-first.
    ///
    /// An upstream "unavailable" answer resolves to a titled placeholder and
    /// is cached like a real result, so dead videos are not refetched on
    /// every render. Network and parse failures are not cached.
    pub async fn video_info(&self, id: &VideoId) -> Option<VideoMetadata> {
        let key = id.to_string();
        if let Some(found) = self.cache.get(&key).await {
            return Some(found);
        }

        match self.client.video_info(id).await {
            Ok(info) => {
                self.cache.insert(key, info.clone()).await;
                Some(info)
            }
            Err(BilibiliError::Api { code, message }) => {
                debug!(video_id = %id, code, message, "video unavailable, caching placeholder");
                let placeholder = placeholder_for(id);
                self.cache.insert(key, placeholder.clone()).await;
                Some(placeholder)
            }
            Err(err) => {
                warn!(video_id = %id, error = %err, "video metadata fetch failed");
                None
            }
        }
    }

    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

fn placeholder_for(id: &VideoId) -> VideoMetadata {
    let (external_id, public_id) = match id {
        VideoId::Aid(aid) => (*aid, String::new()),
        VideoId::Bvid(bvid) => (0, bvid.clone()),
    };
    VideoMetadata {
        external_id,
        public_id,
        title: UNAVAILABLE_TITLE.to_string(),
        cover_url: String::new(),
        duration_seconds: 0,
        published_at: 0,
        owner: None,
    }
}
