use error_stack::{Report, Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::database::{PgStore, Store};
use crate::hooks::HookList;
use crate::mailer::Mailer;
use crate::config;

/// Everything a request needs, shared across HTTP workers.
#[derive(Debug, Clone)]
pub struct App {
    pub config: Arc<config::Server>,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<Mailer>,
    pub hooks: Arc<HookList>,
}

#[derive(Debug, Error)]
#[error("Failed to initialize App struct")]
pub struct AppError;

impl App {
    /// Connects to Postgres, runs pending migrations and wires up
    /// the rest of the app.
    #[tracing::instrument(skip_all, name = "app.init")]
    pub async fn new(cfg: config::Server) -> Result<Self, AppError> {
        let Some(db) = cfg.db.as_ref() else {
            return Err(Report::new(AppError)
                .attach_printable("database configuration is required without --in-memory"));
        };

        let store = PgStore::connect(db).await.change_context(AppError)?;
        store.migrate().await.change_context(AppError)?;

        Self::with_store(cfg, Arc::new(store))
    }

    /// Builds the app on top of an already prepared store.
    pub fn with_store(cfg: config::Server, store: Arc<dyn Store>) -> Result<Self, AppError> {
        let mailer = Mailer::from_config(&cfg.mailer).change_context(AppError)?;
        Ok(Self::from_parts(cfg, store, mailer))
    }

    #[must_use]
    pub fn from_parts(cfg: config::Server, store: Arc<dyn Store>, mailer: Mailer) -> Self {
        let mailer = Arc::new(mailer);
        let hooks = HookList::from_config(&cfg, &store, &mailer);
        tracing::debug!(hooks = ?hooks, "registered follow hooks");

        Self {
            config: Arc::new(cfg),
            store,
            mailer,
            hooks: Arc::new(hooks),
        }
    }
}
