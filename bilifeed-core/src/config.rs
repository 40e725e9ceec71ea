use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub refresher: RefresherConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// App API host (archive listing)
    pub api_base: String,
    /// Web API host (single-video view)
    pub web_api_base: String,
    pub app_key: String,
    pub app_secret: String,
    /// Number of videos requested per creator (`ps` query parameter)
    pub videos_per_creator: u32,
    pub request_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: "https://app.bilibili.com".to_string(),
            web_api_base: "https://api.bilibili.com".to_string(),
            // Android app credential pair; the archive endpoint rejects
            // unsigned or web-keyed requests.
            app_key: "dfca71928277209b".to_string(),
            app_secret: "b5475a8825547a4fc26c7d518eaaa02e".to_string(),
            videos_per_creator: 10,
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window for per-creator archive snapshots
    pub archive_ttl_hours: u64,
    pub metadata_ttl_hours: u64,
    pub metadata_max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            archive_ttl_hours: 48,
            metadata_ttl_hours: 48,
            metadata_max_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefresherConfig {
    /// How often the background sweep runs
    pub interval_minutes: u64,
    /// Pause between consecutive upstream calls within one sweep
    pub fetch_delay_millis: u64,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            fetch_delay_millis: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Maximum number of concurrent upstream fetches during one feed call
    pub fanout_concurrency: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: crate::models::DEFAULT_PAGE_SIZE,
            max_page_size: crate::models::MAX_PAGE_SIZE,
            fanout_concurrency: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // Override with environment variables (BILIFEED_FEED_MAX_PAGE_SIZE, etc.)
        builder = builder.add_source(
            Environment::with_prefix("BILIFEED")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    #[must_use]
    pub const fn archive_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.archive_ttl_hours * 3600)
    }

    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresher.interval_minutes * 60)
    }

    #[must_use]
    pub const fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.refresher.fetch_delay_millis)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.archive_ttl_hours, 48);
        assert_eq!(config.refresher.interval_minutes, 30);
        assert_eq!(config.refresher.fetch_delay_millis, 1_000);
        assert_eq!(config.feed.fanout_concurrency, 10);
        assert_eq!(config.feed.default_page_size, 20);
        assert_eq!(config.upstream.videos_per_creator, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_duration_helpers() {
        let config = Config::default();
        assert_eq!(config.archive_ttl(), Duration::from_secs(48 * 3600));
        assert_eq!(config.refresh_interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.fetch_delay(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some("/nonexistent/bilifeed.toml")).unwrap();
        assert_eq!(config.feed.max_page_size, 100);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[refresher]\ninterval_minutes = 5\nfetch_delay_millis = 250\n\n[feed]\nfanout_concurrency = 4\n"
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.refresher.interval_minutes, 5);
        assert_eq!(config.refresher.fetch_delay_millis, 250);
        assert_eq!(config.feed.fanout_concurrency, 4);
        // Untouched sections keep their defaults
        assert_eq!(config.cache.archive_ttl_hours, 48);
    }
}
