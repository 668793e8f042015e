use std::num::{NonZeroU32, NonZeroU64};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use error_stack::Report;

use crate::config;
use crate::database::MemoryStore;
use crate::http::Jwt;
use crate::mailer::{MailTransport, Mailer, OutgoingEmail, Sender, TransportError};
use crate::types::id::{marker::UserMarker, Id};
use crate::util::Sensitive;
use crate::App;

pub const JWT_SECRET: &str = "shabdsetu-test-secret";

#[must_use]
pub fn test_config() -> config::Server {
    config::Server {
        http: config::Http::default(),
        db: None,
        auth: config::Auth {
            jwt_secret: Sensitive::new(JWT_SECRET.to_string()),
        },
        mailer: config::Mailer::default(),
        notifications: config::Notifications::default(),
        logging: config::Logging::default(),
    }
}

/// Postgres settings taken from `DATABASE_URL`. Tests that need a live
/// database skip themselves when it is not set.
#[must_use]
pub fn database_config() -> Option<config::Database> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(config::Database {
        primary: config::DbPoolConfig {
            readonly: false,
            min_idle: None,
            pool_size: NonZeroU32::new(4).unwrap(),
            url: Sensitive::new(url),
        },
        replica: None,
        enforce_tls: false,
        timeout_secs: NonZeroU64::new(5).unwrap(),
    })
}

/// Mail transport that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
    failure: Option<TransportError>,
}

impl RecordingTransport {
    #[must_use]
    pub fn failing(error: TransportError) -> Self {
        Self {
            sent: Mutex::default(),
            failure: Some(error),
        }
    }

    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, email: &OutgoingEmail) -> error_stack::Result<(), TransportError> {
        if let Some(failure) = self.failure.clone() {
            return Err(Report::new(failure));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub app: App,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<RecordingTransport>,
}

impl TestApp {
    /// Registers a user named `name` with `{name}@test.com` as address.
    pub async fn create_user(&self, name: &str) -> Id<UserMarker> {
        let email = format!("{name}@test.com");
        self.store.create_user(name, Some(name), Some(&email)).await
    }

    #[must_use]
    pub fn token(&self, user: Id<UserMarker>) -> String {
        Jwt::new(user, 60)
            .encode(self.app.config.auth.jwt_secret.as_str())
            .unwrap()
    }
}

/// App backed by [`MemoryStore`] and a mailer that records instead of
/// sending. Follow notifications are enabled.
pub async fn build_test_app() -> TestApp {
    crate::logging::init_for_tests();

    let cfg = test_config();
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::default());

    let dyn_transport: Arc<dyn MailTransport> = transport.clone();
    let mailer = Mailer::new(Sender::from_config(&cfg.mailer), Some(dyn_transport));
    let app = App::from_parts(cfg, store.clone(), mailer);

    TestApp {
        app,
        store,
        transport,
    }
}
