//! Controller configuration module

use std::{io, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::config::{
    kube::KubeArgs, logging::LoggingConfig, migration::MigrationArgs, openbao::OpenBaoArgs,
};

pub(crate) mod kube;
pub(crate) mod logging;
pub(crate) mod migration;
pub(crate) mod openbao;

pub(crate) use logging::LogFormat;

/// Errors raised while resolving configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Kubernetes bearer token is empty")]
    EmptyToken,
}

/// SPI token migration controller configuration
#[derive(Debug, Parser)]
#[command(
    name = "spi-migration-controller",
    about = "Migrates SPI token secrets into access tokens",
    long_about = None
)]
pub struct ControllerConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Kubernetes API settings.
    #[command(flatten)]
    pub kube: KubeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Migrate labeled token secrets
    Migrate(MigrateArgs),

    /// List outstanding migration failures
    Diagnostics(DiagnosticsArgs),
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Token storage settings.
    #[command(flatten)]
    pub openbao: OpenBaoArgs,

    /// Migration policy settings.
    #[command(flatten)]
    pub migration: MigrationArgs,
}

#[derive(Debug, Args)]
pub struct DiagnosticsArgs {
    /// Only list records in this namespace
    #[arg(long)]
    pub namespace: Option<String>,
}

impl ControllerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
