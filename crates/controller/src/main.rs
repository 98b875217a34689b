//! SPI token migration controller

use std::process;

use tracing::error;

use crate::config::ControllerConfig;

mod commands;
mod config;
mod observability;
mod shutdown;

/// Controller entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ControllerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(e) = observability::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, eprintln is the only channel left"
        )]
        {
            eprintln!("failed to initialise logging: {e}");
        }

        process::exit(1);
    }

    if let Err(command_error) = commands::run(config.command, &config.kube).await {
        error!("{}", commands::error_chain(&command_error));

        process::exit(1);
    }
}
