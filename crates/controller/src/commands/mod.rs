//! Controller commands

use spi_migration::{
    context::AppInitError, migration::MigrationError, objects::RepositoryError,
};
use thiserror::Error;

use crate::config::{Command, ConfigError, kube::KubeArgs};

mod diagnostics;
mod migrate;

#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("failed to initialise controller")]
    Init(#[from] AppInitError),

    #[error("Kubernetes API request failed")]
    Repository(#[from] RepositoryError),

    #[error("migration aborted")]
    Migration(#[from] MigrationError),
}

pub(crate) async fn run(command: Command, kube: &KubeArgs) -> Result<(), CommandError> {
    let kube = kube.load()?;

    match command {
        Command::Migrate(args) => migrate::run(args, kube).await,
        Command::Diagnostics(args) => diagnostics::run(args, kube).await,
    }
}

/// Formats an error with its source chain, `outer: inner: ...`.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
