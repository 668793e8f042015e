use serde::Serialize;

use crate::http::Error;
use crate::types::id::{marker::UserMarker, Id};
use crate::App;

#[derive(Debug)]
pub struct GetFollowStats {
    pub user: Id<UserMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStats {
    pub followers_count: u64,
    pub following_count: u64,
}

impl GetFollowStats {
    #[tracing::instrument(skip(app), name = "services.follow.stats")]
    pub async fn perform(self, app: &App) -> Result<FollowStats, Error> {
        let followers_count = app.store.count_followers(self.user).await?;
        let following_count = app.store.count_following(self.user).await?;
        Ok(FollowStats {
            followers_count,
            following_count,
        })
    }
}
