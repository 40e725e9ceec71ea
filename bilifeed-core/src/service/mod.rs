pub mod feed;
pub mod follow;
pub mod metadata;
pub mod refresher;

pub use feed::FeedService;
pub use follow::{FollowDirectory, StaticFollowDirectory};
pub use metadata::VideoMetadataService;
pub use refresher::ArchiveRefresher;
