use async_trait::async_trait;
use error_stack::{Result, ResultExt};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config;
use crate::database::Store;
use crate::mailer::{FollowNotification, Mailer};
use crate::types::id::{marker::UserMarker, Id};

#[derive(Debug, Error)]
#[error("Follow hook failed")]
pub struct HookError;

/// Side effect that runs after a new follow edge has been stored.
#[async_trait]
pub trait FollowHook: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn after_follow(
        &self,
        follower: Id<UserMarker>,
        target: Id<UserMarker>,
    ) -> Result<(), HookError>;
}

/// Registered follow hooks, run inline in registration order.
///
/// A failing hook is logged and skipped. It never fails the follow itself.
#[derive(Default)]
pub struct HookList {
    hooks: Vec<Box<dyn FollowHook>>,
}

impl HookList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks the server starts with, depending on configuration.
    #[must_use]
    pub fn from_config(cfg: &config::Server, store: &Arc<dyn Store>, mailer: &Arc<Mailer>) -> Self {
        let mut hooks = Self::new();
        if cfg.notifications.follow_email && mailer.is_enabled() {
            hooks.register(FollowEmailNotifier::new(store.clone(), mailer.clone()));
        } else {
            tracing::debug!("follow email notifications are disabled");
        }
        hooks
    }

    pub fn register(&mut self, hook: impl FollowHook) {
        self.hooks.push(Box::new(hook));
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|v| v.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    #[tracing::instrument(skip(self), name = "hooks.after_follow")]
    pub async fn after_follow(&self, follower: Id<UserMarker>, target: Id<UserMarker>) {
        for hook in &self.hooks {
            if let Err(error) = hook.after_follow(follower, target).await {
                tracing::warn!(hook = hook.name(), error = ?error, "follow hook failed");
            }
        }
    }
}

impl std::fmt::Debug for HookList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Emails the followed user, if they have an address on file.
#[derive(Debug)]
pub struct FollowEmailNotifier {
    store: Arc<dyn Store>,
    mailer: Arc<Mailer>,
}

impl FollowEmailNotifier {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, mailer: Arc<Mailer>) -> Self {
        Self { store, mailer }
    }
}

#[async_trait]
impl FollowHook for FollowEmailNotifier {
    fn name(&self) -> &'static str {
        "follow_email_notifier"
    }

    #[tracing::instrument(skip(self), name = "hooks.follow_email_notifier")]
    async fn after_follow(
        &self,
        follower: Id<UserMarker>,
        target: Id<UserMarker>,
    ) -> Result<(), HookError> {
        let target = self.store.find_user(target).await.change_context(HookError)?;
        let Some(target) = target else {
            return Ok(());
        };

        let Some(email) = target.email.filter(|v| !v.is_empty()) else {
            tracing::debug!(user.id = %target.id, "followed user has no email address");
            return Ok(());
        };

        let follower_name = self
            .store
            .find_user(follower)
            .await
            .change_context(HookError)?
            .map_or_else(|| "Someone".to_string(), |v| v.name);

        self.mailer
            .send_follow_notification(FollowNotification {
                to: json!({ "email": email, "name": target.name }),
                follower_name,
            })
            .await
            .change_context(HookError)
    }
}
