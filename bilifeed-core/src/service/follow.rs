//! Follow-list collaborator seam
//!
//! The follow store lives outside this crate; the feed core only ever reads
//! two things from it: the distinct set of creators anyone follows (for the
//! background sweep) and display profiles for the page join.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::{CreatorId, CreatorProfile};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowDirectory: Send + Sync {
    /// Distinct creator ids followed by any local user
    async fn followed_creators(&self) -> Vec<CreatorId>;

    /// Display profiles for the given creators; unknown ids are omitted
    async fn creator_profiles(
        &self,
        creators: &[CreatorId],
    ) -> HashMap<CreatorId, CreatorProfile>;
}

/// Fixed in-memory directory, used by the probe binary and in tests
#[derive(Debug, Default)]
pub struct StaticFollowDirectory {
    profiles: HashMap<CreatorId, CreatorProfile>,
}

impl StaticFollowDirectory {
    #[must_use]
    pub fn new(profiles: impl IntoIterator<Item = CreatorProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.creator_id, p))
                .collect(),
        }
    }

    /// Directory of bare ids with no display data
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = CreatorId>) -> Self {
        Self::new(ids.into_iter().map(|creator_id| CreatorProfile {
            creator_id,
            display_name: String::new(),
            avatar_url: String::new(),
        }))
    }
}

#[async_trait]
impl FollowDirectory for StaticFollowDirectory {
    async fn followed_creators(&self) -> Vec<CreatorId> {
        self.profiles.keys().copied().collect()
    }

    async fn creator_profiles(
        &self,
        creators: &[CreatorId],
    ) -> HashMap<CreatorId, CreatorProfile> {
        creators
            .iter()
            .filter_map(|id| self.profiles.get(id).map(|p| (*id, p.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_profiles() {
        let directory = StaticFollowDirectory::new([CreatorProfile {
            creator_id: CreatorId(1),
            display_name: "creator one".to_string(),
            avatar_url: "https://example.com/1.jpg".to_string(),
        }]);

        let profiles = directory
            .creator_profiles(&[CreatorId(1), CreatorId(2)])
            .await;
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[&CreatorId(1)].display_name, "creator one");

        let followed = directory.followed_creators().await;
        assert_eq!(followed, vec![CreatorId(1)]);
    }
}
