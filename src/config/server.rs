use error_stack::{Report, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

use super::ParseError;
use crate::util::{figment::FigmentErrorAttachable, Sensitive};

#[derive(Debug, Deserialize)]
pub struct Server {
    #[serde(default)]
    pub http: Http,
    /// Postgres connection settings. It can only be omitted when
    /// the server runs with the in-memory store.
    #[serde(default)]
    pub db: Option<super::Database>,
    pub auth: Auth,
    #[serde(default)]
    pub mailer: super::Mailer,
    #[serde(default)]
    pub notifications: super::Notifications,
    #[serde(default)]
    pub logging: super::Logging,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    /// **Environment variables**:
    /// - `SHABDSETU_HTTP_IP`
    #[serde(default = "Http::default_ip")]
    pub ip: IpAddr,
    /// **Environment variables**:
    /// - `SHABDSETU_HTTP_PORT`
    #[serde(default = "Http::default_port")]
    pub port: u16,
    /// Amount of HTTP workers. Defaults to the available parallelism
    /// of the machine.
    ///
    /// **Environment variables**:
    /// - `SHABDSETU_HTTP_WORKERS`
    #[serde(default = "Http::default_workers")]
    pub workers: usize,
}

impl Http {
    const DEFAULT_PORT: u16 = 3000;

    const fn default_ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    const fn default_port() -> u16 {
        Self::DEFAULT_PORT
    }

    fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    }
}

impl Default for Http {
    fn default() -> Self {
        Self {
            ip: Self::default_ip(),
            port: Self::default_port(),
            workers: Self::default_workers(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Secret used to verify HS512 signed access tokens.
    ///
    /// **Environment variables**:
    /// - `SHABDSETU_AUTH_JWT_SECRET` or `JWT_SECRET`
    pub jwt_secret: Sensitive<String>,
}

impl Server {
    pub fn load() -> Result<Self, ParseError> {
        dotenvy::dotenv().ok();

        let config = Self::figment()
            .extract::<Self>()
            .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks every value that serde alone cannot reject.
    pub fn validate(&self) -> Result<(), ParseError> {
        let mut problems = Vec::new();

        let secret_len = self.auth.jwt_secret.as_str().len();
        if !(12..=1024).contains(&secret_len) {
            problems.push("auth.jwt_secret: Invalid JWT secret key".to_string());
        }
        if let Some(db) = self.db.as_ref() {
            problems.extend(db.problems());
        }
        problems.extend(self.mailer.problems());

        if problems.is_empty() {
            return Ok(());
        }

        let mut report = Report::new(ParseError);
        for problem in problems {
            report = report.attach_printable(problem);
        }
        Err(report)
    }
}

impl Server {
    const DEFAULT_CONFIG_FILE: &'static str = "shabdsetu.toml";

    /// Environment variables recognized without the `SHABDSETU_` prefix.
    const ENV_ALIASES: &'static [&'static str] = &[
        "BREVO_API_BASE_URL",
        "BREVO_API_KEY",
        "BREVO_SENDER_EMAIL",
        "BREVO_SENDER_NAME",
        "DATABASE_URL",
        "JWT_SECRET",
    ];

    /// Creates a default [`Figment`] object to load server
    /// configuration. This function is there for [`Server::load`]
    /// and testing.
    ///
    /// [`Figment`]: figment::Figment
    pub(crate) fn figment() -> figment::Figment {
        use figment::{
            providers::{Env, Format, Toml},
            Figment,
        };

        Figment::new()
            .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
            // The env provider splits on every underscore so fields
            // with an underscore in their name need an explicit mapping.
            .merge(Env::prefixed("SHABDSETU_").map(|v| {
                match v.as_str().to_ascii_uppercase().as_str() {
                    "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
                    "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

                    "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
                    "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

                    "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
                    "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

                    "AUTH_JWT_SECRET" => "auth.jwt_secret".into(),

                    "MAILER_API_KEY" => "mailer.api_key".into(),
                    "MAILER_API_BASE_URL" => "mailer.api_base_url".into(),
                    "MAILER_SENDER_EMAIL" => "mailer.sender_email".into(),
                    "MAILER_SENDER_NAME" => "mailer.sender_name".into(),

                    "NOTIFICATIONS_FOLLOW_EMAIL" => "notifications.follow_email".into(),

                    other => other.replace('_', ".").to_lowercase().into(),
                }
            }))
            .merge(Env::raw().only(Self::ENV_ALIASES).map(|v| {
                match v.as_str().to_ascii_uppercase().as_str() {
                    "BREVO_API_BASE_URL" => "mailer.api_base_url".into(),
                    "BREVO_API_KEY" => "mailer.api_key".into(),
                    "BREVO_SENDER_EMAIL" => "mailer.sender_email".into(),
                    "BREVO_SENDER_NAME" => "mailer.sender_name".into(),
                    "DATABASE_URL" => "db.primary.url".into(),
                    "JWT_SECRET" => "auth.jwt_secret".into(),
                    _ => v.into(),
                }
            }))
    }
}
