//! Feed pipeline probe
//!
//! Builds the full fetch→cache→aggregate pipeline against the real upstream
//! for a handful of creator ids and prints one feed page as JSON. Useful for
//! checking credentials, signing and the merge behavior by hand.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use bilifeed_core::bilibili::ArchiveClient;
use bilifeed_core::cache::ArchiveCache;
use bilifeed_core::models::{CreatorId, FeedCursor};
use bilifeed_core::service::{FeedService, StaticFollowDirectory};
use bilifeed_core::{logging, Config};

#[derive(Parser, Debug)]
#[command(name = "feed-probe", about = "Fetch one merged feed page for a set of creators")]
struct Args {
    /// Path to a config file (defaults + BILIFEED_* env otherwise)
    #[arg(long)]
    config: Option<String>,

    /// Creator id to include; repeatable
    #[arg(long = "creator", required = true)]
    creators: Vec<u64>,

    /// Page size (defaults to the configured feed page size)
    #[arg(long)]
    page_size: Option<u32>,

    /// Cursor from a previous page ("<published_at>:<video_id>")
    #[arg(long)]
    cursor: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("loading configuration")?;
    logging::init_logging(&config.logging)?;

    let cursor = args
        .cursor
        .as_deref()
        .map(str::parse::<FeedCursor>)
        .transpose()
        .context("parsing cursor")?;
    let creators: Vec<CreatorId> = args.creators.iter().copied().map(CreatorId).collect();

    let client = Arc::new(ArchiveClient::new(&config.upstream).context("building upstream client")?);
    let cache = Arc::new(ArchiveCache::new(config.archive_ttl()));
    let follows = Arc::new(StaticFollowDirectory::from_ids(creators.iter().copied()));
    let service = FeedService::new(cache, client, follows, config.feed.clone());

    let page = service.feed_page(&creators, cursor, args.page_size).await;
    println!("{}", serde_json::to_string_pretty(&page)?);

    Ok(())
}
