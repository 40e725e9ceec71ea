//! Bilibili HTTP client
//!
//! One signed GET per creator against the app archive-cursor endpoint, plus
//! the single-video metadata view call. Every request carries the
//! device-emulating header set the app API expects; the archive endpoint
//! rejects requests without it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::error::{check_response, json_with_limit, BilibiliError};
use super::sign::{sign_now, AppCredentials};
use super::types::{ArchiveResp, ViewResp};
use crate::config::UpstreamConfig;
use crate::models::{CreatorId, VideoId, VideoMetadata, VideoSummary};

const APP_USER_AGENT: &str = "Mozilla/5.0 BiliDroid/8.43.0 (bbcallen@gmail.com) os/android model/android mobi_app/android build/8430300 channel/master innerVer/8430300 osVer/15 network/2";
const WEB_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const REFERER: &str = "https://www.bilibili.com";
const APP_STATISTICS: &str = r#"{"appId":1,"platform":3,"version":"8.43.0","abtest":""}"#;

/// Injectable fetch seam consumed by the aggregator and the refresher.
///
/// Implementations return typed errors; callers absorb every one of them
/// into "no videos this round" and keep going.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Most recent videos of one creator, newest first (upstream order)
    async fn recent_videos(&self, creator: CreatorId) -> Result<Vec<VideoSummary>, BilibiliError>;
}

/// Bilibili app-API client
pub struct ArchiveClient {
    client: Client,
    api_base: String,
    web_api_base: String,
    credentials: AppCredentials,
    page_size: u32,
}

impl ArchiveClient {
    /// Create a client from upstream configuration.
    ///
    /// Redirects are disabled to prevent SSRF via redirect to private IPs.
    pub fn new(config: &UpstreamConfig) -> Result<Self, BilibiliError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            web_api_base: config.web_api_base.trim_end_matches('/').to_string(),
            credentials: AppCredentials::new(&config.app_key, &config.app_secret),
            page_size: config.videos_per_creator,
        })
    }

    /// Fetch one creator's recent archive page, ordered by publish date.
    pub async fn fetch_archive(
        &self,
        creator: CreatorId,
    ) -> Result<Vec<VideoSummary>, BilibiliError> {
        if creator.as_u64() == 0 {
            return Err(BilibiliError::InvalidRequest(
                "creator id must be non-zero".to_string(),
            ));
        }

        let mut params: HashMap<String, String> = HashMap::from([
            ("vmid".to_string(), creator.to_string()),
            ("ps".to_string(), self.page_size.to_string()),
            ("order".to_string(), "pubdate".to_string()),
            ("qn".to_string(), "80".to_string()),
            ("build".to_string(), "8430300".to_string()),
            ("version".to_string(), "8.43.0".to_string()),
            ("mobi_app".to_string(), "android".to_string()),
            ("platform".to_string(), "android".to_string()),
            ("channel".to_string(), "master".to_string()),
            ("c_locale".to_string(), "zh_CN".to_string()),
            ("s_locale".to_string(), "zh_CN".to_string()),
            ("statistics".to_string(), APP_STATISTICS.to_string()),
        ]);
        sign_now(&mut params, &self.credentials);

        let mut pairs: Vec<(String, String)> = params.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let url = format!("{}/x/v2/space/archive/cursor", self.api_base);
        let req = self
            .client
            .get(&url)
            .query(&pairs)
            .header("Referer", REFERER)
            .header("bili-http-engine", "cronet");

        let resp = check_response(req.send().await?)?;
        let envelope: ArchiveResp = json_with_limit(resp).await?;

        if envelope.code != 0 {
            return Err(BilibiliError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }

        let items = envelope.data.unwrap_or_default().item;
        Ok(items
            .into_iter()
            .map(|item| VideoSummary {
                external_id: decode_item_id(&item.param),
                public_id: item.bvid,
                title: item.title,
                cover_url: item.cover,
                duration_seconds: item.duration,
                published_at: item.ctime,
                play_count: item.play,
                comment_count: item.danmaku,
            })
            .collect())
    }

    /// Fetch metadata for a single video via the web view endpoint.
    pub async fn video_info(&self, id: &VideoId) -> Result<VideoMetadata, BilibiliError> {
        let query: (&str, String) = match id {
            VideoId::Aid(aid) => ("aid", aid.to_string()),
            VideoId::Bvid(bvid) => {
                if bvid.is_empty() {
                    return Err(BilibiliError::InvalidRequest("empty bvid".to_string()));
                }
                ("bvid", bvid.clone())
            }
        };

        let url = format!("{}/x/web-interface/view", self.web_api_base);
        let req = self
            .client
            .get(&url)
            .query(&[query])
            .header("User-Agent", WEB_USER_AGENT)
            .header("Referer", REFERER);

        let resp = check_response(req.send().await?)?;
        let envelope: ViewResp = json_with_limit(resp).await?;

        if envelope.code != 0 {
            return Err(BilibiliError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| BilibiliError::Parse("missing view data".to_string()))?;
        Ok(VideoMetadata {
            external_id: data.aid,
            public_id: data.bvid,
            title: data.title,
            cover_url: data.pic,
            duration_seconds: data.duration,
            published_at: data.pubdate,
            owner: Some(crate::models::CreatorProfile {
                creator_id: CreatorId(data.owner.mid),
                display_name: data.owner.name,
                avatar_url: data.owner.face,
            }),
        })
    }
}

#[async_trait]
impl VideoSource for ArchiveClient {
    async fn recent_videos(&self, creator: CreatorId) -> Result<Vec<VideoSummary>, BilibiliError> {
        self.fetch_archive(creator).await
    }
}

/// Decode the numeric video id from the mixed textual `param` field.
///
/// Takes the leading decimal digits, 0 when there are none (the original
/// feed treats an undecodable id the same way).
fn decode_item_id(param: &str) -> u64 {
    let digits: &str = param
        .trim_start()
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    digits.parse().unwrap_or(0)
}
