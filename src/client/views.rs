use async_trait::async_trait;
use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::types::id::{marker::BlogMarker, Id};
use crate::util::Sensitive;

#[derive(Debug, Error)]
#[error("Failed to reach the view API")]
pub struct ViewApiError;

/// The two view endpoints a [`ViewCounter`] needs.
#[async_trait]
pub trait ViewApi: Send + Sync {
    async fn add_view(&self, blog_id: Id<BlogMarker>) -> Result<(), ViewApiError>;

    async fn view_count(&self, blog_id: Id<BlogMarker>) -> Result<u64, ViewApiError>;
}

/// [`ViewApi`] over HTTP, authenticating with a bearer token if given.
#[derive(Debug, Clone)]
pub struct HttpViewApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<Sensitive<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewCountResponse {
    #[serde(default)]
    view_count: Option<u64>,
}

impl HttpViewApi {
    pub fn new(base_url: &Url, token: Option<Sensitive<String>>) -> Result<Self, ViewApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .change_context(ViewApiError)?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.as_ref() {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ViewApiError> {
        let response = self
            .request(builder)
            .send()
            .await
            .change_context(ViewApiError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Report::new(ViewApiError)
                .attach_printable(format!("server responded with {status}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl ViewApi for HttpViewApi {
    #[tracing::instrument(skip(self), name = "client.views.add")]
    async fn add_view(&self, blog_id: Id<BlogMarker>) -> Result<(), ViewApiError> {
        let url = format!("{}/view/add-view", self.base_url);
        let builder = self
            .client
            .post(url)
            .json(&json!({ "blogId": blog_id }));

        self.send(builder).await.map(|_| ())
    }

    #[tracing::instrument(skip(self), name = "client.views.count")]
    async fn view_count(&self, blog_id: Id<BlogMarker>) -> Result<u64, ViewApiError> {
        let url = format!("{}/view/{blog_id}", self.base_url);
        let response = self.send(self.client.get(url)).await?;
        let body = response
            .json::<ViewCountResponse>()
            .await
            .change_context(ViewApiError)
            .attach_printable("unexpected response body")?;

        Ok(body.view_count.unwrap_or_default())
    }
}

/// Authentication state as seen by the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_logged_in: bool,
    /// Whether persisted auth state has been restored yet. Until then
    /// `is_logged_in` cannot be trusted.
    pub rehydrated: bool,
}

/// Displays the view count of a blog and, when asked to, records one
/// view per blog for the lifetime of the counter.
#[derive(Debug)]
pub struct ViewCounter<A> {
    api: A,
    add_view: bool,
    last_blog_id: Option<Id<BlogMarker>>,
    has_added_view: bool,
    count: u64,
    loading: bool,
}

impl<A: ViewApi> ViewCounter<A> {
    #[must_use]
    pub fn new(api: A, add_view: bool) -> Self {
        Self {
            api,
            add_view,
            last_blog_id: None,
            has_added_view: false,
            count: 0,
            loading: true,
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Called whenever the displayed blog or the auth state changes.
    ///
    /// Errors never surface from here. A failed increment is logged and
    /// not retried for the same blog; a failed read keeps the last count.
    #[tracing::instrument(skip(self), name = "client.views.sync")]
    pub async fn sync(&mut self, blog_id: Option<Id<BlogMarker>>, auth: AuthState) {
        if self.last_blog_id != blog_id {
            self.last_blog_id = blog_id;
            self.has_added_view = false;
        }

        let Some(blog_id) = blog_id else {
            return;
        };

        // wait until we know whether the reader is logged in
        if self.add_view && !auth.rehydrated {
            return;
        }

        if self.add_view && auth.is_logged_in && !self.has_added_view {
            self.has_added_view = true;
            if let Err(error) = self.api.add_view(blog_id).await {
                tracing::warn!(%blog_id, error = ?error, "Failed to add view");
            }
        }

        match self.api.view_count(blog_id).await {
            Ok(count) => self.count = count,
            Err(error) => tracing::error!(%blog_id, error = ?error, "Error with view count"),
        }
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Add(u64),
        Count(u64),
    }

    #[derive(Debug, Default)]
    struct RecordingViewApi {
        calls: Mutex<Vec<Call>>,
        count: u64,
        fail_add: bool,
        fail_count: bool,
    }

    impl RecordingViewApi {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ViewApi for RecordingViewApi {
        async fn add_view(&self, blog_id: Id<BlogMarker>) -> Result<(), ViewApiError> {
            self.calls.lock().unwrap().push(Call::Add(blog_id.get()));
            if self.fail_add {
                return Err(Report::new(ViewApiError));
            }
            Ok(())
        }

        async fn view_count(&self, blog_id: Id<BlogMarker>) -> Result<u64, ViewApiError> {
            self.calls.lock().unwrap().push(Call::Count(blog_id.get()));
            if self.fail_count {
                return Err(Report::new(ViewApiError));
            }
            Ok(self.count)
        }
    }

    const LOGGED_IN: AuthState = AuthState {
        is_logged_in: true,
        rehydrated: true,
    };

    #[tokio::test]
    async fn should_add_view_once_per_blog() {
        let api = RecordingViewApi {
            count: 10,
            ..Default::default()
        };
        let mut counter = ViewCounter::new(api, true);

        counter.sync(Some(Id::new(1)), LOGGED_IN).await;
        assert_eq!(counter.api().calls(), vec![Call::Add(1), Call::Count(1)]);
        assert_eq!(counter.count(), 10);
        assert!(!counter.is_loading());

        counter.sync(Some(Id::new(1)), LOGGED_IN).await;
        assert_eq!(
            counter.api().calls(),
            vec![Call::Add(1), Call::Count(1), Call::Count(1)]
        );

        counter.sync(Some(Id::new(2)), LOGGED_IN).await;
        assert_eq!(
            counter.api().calls()[3..].to_vec(),
            vec![Call::Add(2), Call::Count(2)]
        );
    }

    #[tokio::test]
    async fn should_wait_for_rehydration() {
        let mut counter = ViewCounter::new(RecordingViewApi::default(), true);
        let auth = AuthState {
            is_logged_in: false,
            rehydrated: false,
        };

        counter.sync(Some(Id::new(1)), auth).await;
        assert!(counter.api().calls().is_empty());
        assert!(counter.is_loading());
    }

    #[tokio::test]
    async fn should_only_read_for_anonymous_readers() {
        let mut counter = ViewCounter::new(RecordingViewApi::default(), true);
        let auth = AuthState {
            is_logged_in: false,
            rehydrated: true,
        };

        counter.sync(Some(Id::new(1)), auth).await;
        assert_eq!(counter.api().calls(), vec![Call::Count(1)]);
    }

    #[tokio::test]
    async fn should_read_without_add_view_flag() {
        let mut counter = ViewCounter::new(RecordingViewApi::default(), false);
        counter.sync(Some(Id::new(1)), AuthState::default()).await;
        assert_eq!(counter.api().calls(), vec![Call::Count(1)]);
    }

    #[tokio::test]
    async fn should_skip_missing_blog_id() {
        let mut counter = ViewCounter::new(RecordingViewApi::default(), false);
        counter.sync(None, LOGGED_IN).await;
        assert!(counter.api().calls().is_empty());
    }

    #[tokio::test]
    async fn should_survive_failures() {
        let api = RecordingViewApi {
            fail_add: true,
            fail_count: true,
            ..Default::default()
        };
        let mut counter = ViewCounter::new(api, true);

        counter.sync(Some(Id::new(1)), LOGGED_IN).await;
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.api().calls(), vec![Call::Add(1), Call::Count(1)]);

        // a failed increment is not retried for the same blog
        counter.sync(Some(Id::new(1)), LOGGED_IN).await;
        assert_eq!(counter.api().calls().len(), 3);
    }
}
