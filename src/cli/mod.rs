use clap::Parser;
use error_stack::{Result, ResultExt};
use thiserror::Error;

mod send_test_email;
mod server;

/// Command line options for ShabdSetu.
#[derive(Debug, Parser)]
#[command(
    about = "Utility suite for ShabdSetu backend",
    version,
    author,
    long_about
)]
pub struct Cli {
    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(Debug, Error)]
#[error("Failed to run command")]
pub struct CliError;

impl Cli {
    pub fn run(self) -> Result<(), CliError> {
        match self.subcommand {
            Subcommand::Server(args) => self::server::run(args).change_context(CliError),
            Subcommand::SendTestEmail(args) => {
                self::send_test_email::run(args).change_context(CliError)
            }
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Server(self::server::ServerCommand),
    SendTestEmail(self::send_test_email::SendTestEmailCommand),
}
