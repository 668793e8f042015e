use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::{level_filters::LevelFilter, Subscriber};
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan, EnvFilter, Layer};

use crate::config::{self, LoggingStyle};

#[derive(Debug, Error)]
#[error("Failed to initialize tracing")]
pub struct LoggingInitError;

pub fn init(cfg: &config::Logging) -> Result<(), LoggingInitError> {
    let targets = std::env::var("RUST_LOG").unwrap_or_else(|_| cfg.targets.clone());

    let registry = tracing_subscriber::Registry::default()
        .with(console_layer(cfg.style, &targets, false))
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(registry)
        .change_context(LoggingInitError)
        .attach_printable("already initialized tracing")?;

    if std::env::var("RUST_LOG").is_ok() && !cfg.targets.is_empty() {
        tracing::warn!("Both `RUST_LOG` and `logging.targets` are set, `RUST_LOG` takes priority");
    }

    Ok(())
}

/// Installs a subscriber that writes through the test harness. Calling
/// it more than once is harmless.
pub fn init_for_tests() {
    let targets = std::env::var("RUST_LOG").unwrap_or_default();
    let registry = tracing_subscriber::Registry::default()
        .with(console_layer(LoggingStyle::Full, &targets, true))
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(registry).ok();
}

fn console_layer<S>(style: LoggingStyle, targets: &str, for_tests: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer();
    let layer = match (style, for_tests) {
        (_, true) => layer.with_test_writer().boxed(),
        (LoggingStyle::Compact, false) => layer.compact().boxed(),
        (LoggingStyle::Full, false) => layer.boxed(),
        (LoggingStyle::Pretty, false) => layer.pretty().boxed(),
    };
    layer.with_filter(make_env_filter(targets))
}

fn make_env_filter(targets: &str) -> EnvFilter {
    let default_level = if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .parse_lossy(targets)
}
