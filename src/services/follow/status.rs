use crate::http::{Actor, Error};
use crate::types::id::{marker::UserMarker, Id};
use crate::App;

#[derive(Debug)]
pub struct CheckFollowStatus {
    pub target: Id<UserMarker>,
}

impl CheckFollowStatus {
    #[tracing::instrument(skip(app), name = "services.follow.status")]
    pub async fn perform(self, app: &App, actor: &Actor) -> Result<bool, Error> {
        let follower = actor.user_id()?;
        Ok(app.store.find_follow(follower, self.target).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Store;
    use crate::{test_utils, types};

    #[tokio::test]
    async fn should_report_edge_existence() {
        let test = test_utils::build_test_app().await;
        let alice = test.create_user("alice").await;
        let bob = test.create_user("bob").await;

        let request = || CheckFollowStatus { target: bob };
        assert!(!request().perform(&test.app, &Actor::User(alice)).await.unwrap());

        test.store.insert_follow(alice, bob).await.unwrap();
        assert!(request().perform(&test.app, &Actor::User(alice)).await.unwrap());
        assert!(!CheckFollowStatus { target: alice }
            .perform(&test.app, &Actor::User(bob))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn should_require_actor() {
        let test = test_utils::build_test_app().await;
        let error = CheckFollowStatus { target: Id::new(1) }
            .perform(&test.app, &Actor::Anonymous)
            .await
            .unwrap_err();

        assert_eq!(error.as_type(), &types::Error::Unauthorized);
    }
}
