use crate::http::{Actor, Error};
use crate::types::id::{marker::UserMarker, Id};
use crate::{types, App};

/// Follows `target` if the actor does not follow them yet, otherwise
/// unfollows them.
#[derive(Debug)]
pub struct ToggleFollow {
    pub target: Id<UserMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleFollowResponse {
    pub following: bool,
}

impl ToggleFollow {
    #[tracing::instrument(skip(app), name = "services.follow.toggle")]
    pub async fn perform(self, app: &App, actor: &Actor) -> Result<ToggleFollowResponse, Error> {
        let follower = actor.user_id()?;
        if follower == self.target {
            return Err(Error::new(types::Error::InvalidOperation)
                .message("You cannot follow yourself."));
        }

        if app.store.find_user(self.target).await?.is_none() {
            return Err(Error::new(types::Error::NotFound).message("User not found."));
        }

        if app.store.find_follow(follower, self.target).await?.is_some() {
            app.store.delete_follow(follower, self.target).await?;
            return Ok(ToggleFollowResponse { following: false });
        }

        app.store.insert_follow(follower, self.target).await?;
        app.hooks.after_follow(follower, self.target).await;

        Ok(ToggleFollowResponse { following: true })
    }
}
