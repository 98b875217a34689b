//! Migrate command

use spi_migration::{
    context::AppContext,
    kube::KubeConfig,
    migration::{MigrationReport, MigrationService},
    objects::Scope,
};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{commands::CommandError, commands::error_chain, config::MigrateArgs, shutdown};

pub(crate) async fn run(args: MigrateArgs, kube: KubeConfig) -> Result<(), CommandError> {
    let settings = args.migration.settings();
    let scope = args.migration.scope();
    let interval = args.migration.interval();

    let app = AppContext::from_kube(kube, args.openbao.into(), settings)?;

    info!(
        scope = ?scope,
        deletion = ?settings.deletion,
        naming = ?settings.naming,
        "starting token secret migration"
    );

    let cancel = CancellationToken::new();

    // Signals only cancel the token; a secret in progress is never dropped halfway.
    tokio::spawn({
        let cancel = cancel.clone();

        async move {
            if let Err(signal_error) = shutdown::signal().await {
                error!("failed to listen for shutdown signal: {}", error_chain(&signal_error));
                return;
            }

            cancel.cancel();
        }
    });

    let Some(interval) = interval else {
        pass(app.migration.as_ref(), &scope, &cancel).await?;

        return Ok(());
    };

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("stopping periodic migration");

                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        // The next tick retries whatever failed.
        if let Err(pass_error) = pass(app.migration.as_ref(), &scope, &cancel).await {
            error!("migration pass failed: {}", error_chain(&pass_error));
        }
    }
}

async fn pass(
    migration: &dyn MigrationService,
    scope: &Scope,
    cancel: &CancellationToken,
) -> Result<MigrationReport, CommandError> {
    let report = migration.reconcile_until(scope, cancel).await?;

    if report.interrupted {
        warn!(
            migrated = report.migrated.len(),
            failed = report.failed.len(),
            "migration pass interrupted by shutdown"
        );
    } else if report.is_clean() {
        info!(migrated = report.migrated.len(), "migration pass finished");
    } else {
        warn!(
            migrated = report.migrated.len(),
            failed = report.failed.len(),
            "migration pass finished with failures"
        );
    }

    Ok(report)
}
