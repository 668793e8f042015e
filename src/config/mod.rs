use thiserror::Error;

mod database;
mod logging;
mod mailer;
mod seed;
mod server;

pub use database::{Database, DbPoolConfig};
pub use logging::{InvalidLoggingStyle, Logging, LoggingStyle};
pub use mailer::{Mailer, Notifications};
pub use seed::Seed;
pub use server::{Auth, Http, Server};

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
