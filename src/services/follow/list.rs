use crate::http::Error;
use crate::schema::UserSummary;
use crate::types::id::{marker::UserMarker, Id};
use crate::App;

#[derive(Debug)]
pub struct ListFollowers {
    pub user: Id<UserMarker>,
}

impl ListFollowers {
    #[tracing::instrument(skip(app), name = "services.follow.list_followers")]
    pub async fn perform(self, app: &App) -> Result<Vec<UserSummary>, Error> {
        Ok(app.store.list_followers(self.user).await?)
    }
}

#[derive(Debug)]
pub struct ListFollowing {
    pub user: Id<UserMarker>,
}

impl ListFollowing {
    #[tracing::instrument(skip(app), name = "services.follow.list_following")]
    pub async fn perform(self, app: &App) -> Result<Vec<UserSummary>, Error> {
        Ok(app.store.list_following(self.user).await?)
    }
}
