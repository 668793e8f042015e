use crate::http::{Actor, Error};
use crate::types::id::{marker::UserMarker, Id};
use crate::{types, App};

/// Unlike [`ToggleFollow`](super::ToggleFollow), this fails if the actor
/// does not follow `target`.
#[derive(Debug)]
pub struct UnfollowUser {
    pub target: Id<UserMarker>,
}

impl UnfollowUser {
    #[tracing::instrument(skip(app), name = "services.follow.unfollow")]
    pub async fn perform(self, app: &App, actor: &Actor) -> Result<(), Error> {
        let follower = actor.user_id()?;
        if app.store.delete_follow(follower, self.target).await?.is_none() {
            return Err(
                Error::new(types::Error::NotFound).message("You are not following this user.")
            );
        }
        Ok(())
    }
}
