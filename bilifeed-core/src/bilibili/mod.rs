//! Bilibili app-API client: request signing, archive listing, video metadata

pub mod client;
pub mod error;
pub mod sign;
pub mod types;

pub use client::{ArchiveClient, VideoSource};
pub use error::BilibiliError;
pub use sign::AppCredentials;
