use async_trait::async_trait;

use super::Result;
use crate::schema::{FollowEdge, UserSummary};
use crate::types::id::{
    marker::{BlogMarker, UserMarker},
    Id,
};

/// Every persistence operation the services need.
///
/// It is implemented by [`PgStore`](super::PgStore) for production and by
/// [`MemoryStore`](super::MemoryStore) for tests and local development.
#[async_trait]
pub trait Store: std::fmt::Debug + Send + Sync + 'static {
    async fn find_user(&self, id: Id<UserMarker>) -> Result<Option<UserSummary>>;

    async fn find_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<Option<FollowEdge>>;

    /// Creates a follow edge. If the edge already exists (which may
    /// happen with concurrent requests), the existing one is returned.
    async fn insert_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<FollowEdge>;

    /// Deletes a follow edge and returns it, if there was any.
    async fn delete_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<Option<FollowEdge>>;

    /// Users following `user`, newest edge first.
    async fn list_followers(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>>;

    /// Users that `user` follows, newest edge first.
    async fn list_following(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>>;

    async fn count_followers(&self, user: Id<UserMarker>) -> Result<u64>;

    async fn count_following(&self, user: Id<UserMarker>) -> Result<u64>;

    /// Increments the view tally of a blog and returns the new value.
    async fn add_view(&self, blog: Id<BlogMarker>) -> Result<u64>;

    async fn view_count(&self, blog: Id<BlogMarker>) -> Result<u64>;
}
