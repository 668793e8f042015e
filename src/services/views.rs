use crate::http::{Actor, Error};
use crate::types::id::{marker::BlogMarker, Id};
use crate::App;

/// Records one view of a blog by an authenticated reader.
#[derive(Debug)]
pub struct AddView {
    pub blog_id: Id<BlogMarker>,
}

impl AddView {
    #[tracing::instrument(skip(app), name = "services.views.add")]
    pub async fn perform(self, app: &App, actor: &Actor) -> Result<u64, Error> {
        actor.user_id()?;
        Ok(app.store.add_view(self.blog_id).await?)
    }
}

#[derive(Debug)]
pub struct GetViewCount {
    pub blog_id: Id<BlogMarker>,
}

impl GetViewCount {
    #[tracing::instrument(skip(app), name = "services.views.count")]
    pub async fn perform(self, app: &App) -> Result<u64, Error> {
        Ok(app.store.view_count(self.blog_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils, types};

    #[tokio::test]
    async fn should_increment_tally() {
        let test = test_utils::build_test_app().await;
        let alice = test.create_user("alice").await;
        let blog_id = Id::new(7);

        assert_eq!(GetViewCount { blog_id }.perform(&test.app).await.unwrap(), 0);

        let count = AddView { blog_id }
            .perform(&test.app, &Actor::User(alice))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(GetViewCount { blog_id }.perform(&test.app).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_require_actor() {
        let test = test_utils::build_test_app().await;
        let blog_id = Id::new(7);

        let error = AddView { blog_id }
            .perform(&test.app, &Actor::Anonymous)
            .await
            .unwrap_err();

        assert_eq!(error.as_type(), &types::Error::Unauthorized);
        assert_eq!(GetViewCount { blog_id }.perform(&test.app).await.unwrap(), 0);
    }
}
