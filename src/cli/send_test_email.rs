use chrono::{Duration, Utc};
use clap::Parser;
use error_stack::{Result, ResultExt};
use serde_json::json;
use shabdsetu::config::Server as Config;
use shabdsetu::mailer::{Mailer, OtpEmail};
use thiserror::Error;

/// Send a verification email to check the mailer setup
#[derive(Debug, Parser)]
pub struct SendTestEmailCommand {
    #[clap(long)]
    pub to: String,
}

#[derive(Debug, Error)]
#[error("Failed to send test email")]
pub struct SendTestEmailError;

pub fn run(args: SendTestEmailCommand) -> Result<(), SendTestEmailError> {
    let config = Config::load().change_context(SendTestEmailError)?;
    shabdsetu::logging::init(&config.logging).change_context(SendTestEmailError)?;

    let mailer = Mailer::from_config(&config.mailer).change_context(SendTestEmailError)?;
    let code = format!("{:06}", Utc::now().timestamp_subsec_micros() % 1_000_000);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .change_context(SendTestEmailError)
        .attach_printable("could not build tokio runtime")?
        .block_on(mailer.send_otp_email(OtpEmail {
            to: json!(args.to.as_str()),
            code,
            expires_at: Some(Utc::now() + Duration::minutes(10)),
        }))
        .change_context(SendTestEmailError)?;

    tracing::info!(to = %args.to, "Test email sent");
    Ok(())
}
