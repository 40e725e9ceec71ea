pub mod bilibili;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{CreatorId, FeedCursor, FeedItem, FeedPage, VideoSummary};
