//! Migration Config

use std::time::Duration;

use clap::{Args, ValueEnum};
use spi_migration::{
    context::MigrationSettings, migration::DeletionOrder, objects::Scope, tokens::TokenNaming,
};

/// When candidate secrets are deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeletionMode {
    /// Before the payload is stored.
    Eager,

    /// After the payload is stored.
    Deferred,
}

/// How generated access tokens are named.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NamingMode {
    /// Random suffix per creation.
    Random,

    /// Suffix derived from namespace and provider URL.
    Derived,
}

/// Migration policy settings.
#[derive(Debug, Args)]
pub struct MigrationArgs {
    /// Only migrate secrets in this namespace
    #[arg(long, env = "MIGRATION_NAMESPACE")]
    pub namespace: Option<String>,

    /// When to delete migrated secrets (eager, deferred)
    #[arg(
        long,
        env = "MIGRATION_DELETION_ORDER",
        value_enum,
        default_value_t = DeletionMode::Deferred
    )]
    pub deletion_order: DeletionMode,

    /// How to name created access tokens (random, derived)
    #[arg(
        long,
        env = "MIGRATION_TOKEN_NAMING",
        value_enum,
        default_value_t = NamingMode::Derived
    )]
    pub token_naming: NamingMode,

    /// Repeat the migration every N seconds instead of running once
    #[arg(
        long,
        env = "MIGRATION_INTERVAL_SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_seconds: Option<u64>,
}

impl MigrationArgs {
    pub fn settings(&self) -> MigrationSettings {
        MigrationSettings {
            deletion: match self.deletion_order {
                DeletionMode::Eager => DeletionOrder::Eager,
                DeletionMode::Deferred => DeletionOrder::Deferred,
            },
            naming: match self.token_naming {
                NamingMode::Random => TokenNaming::Random,
                NamingMode::Derived => TokenNaming::Derived,
            },
        }
    }

    pub fn scope(&self) -> Scope {
        self.namespace.clone().into()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_seconds.map(Duration::from_secs)
    }
}
