#![allow(non_snake_case)]

use std::process::ExitCode;

use briefingBot::cli::{self, Cli};
use briefingBot::config::{AppConfig, Settings};
use briefingBot::error::BotError;
use briefingBot::logging;
use clap::Parser;
use tracing::error;

async fn start(cli: Cli) -> Result<(), BotError> {
    let config = AppConfig::discover()?;
    let settings = Settings::from_config(&config)?;
    cli::run(cli, settings).await
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "briefingBot stopped");
            ExitCode::FAILURE
        }
    }
}
