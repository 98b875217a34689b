//! Diagnostics command

use spi_migration::{
    diagnostics::{DiagnosticRecord, DiagnosticsRepository},
    kube::{KubeClient, KubeConfig},
    objects::Scope,
};

use crate::{commands::CommandError, config::DiagnosticsArgs};

pub(crate) async fn run(args: DiagnosticsArgs, kube: KubeConfig) -> Result<(), CommandError> {
    let client = KubeClient::new(kube)?;
    let scope = Scope::from(args.namespace);

    let records = client.list(&scope).await?;

    print_records(&records);

    Ok(())
}

#[expect(
    clippy::print_stdout,
    reason = "command output is the listing itself, not a log line"
)]
fn print_records(records: &[DiagnosticRecord]) {
    if records.is_empty() {
        println!("no migration failures recorded");
        return;
    }

    for record in records {
        println!("secret: {}", record.key);
        println!("reason: {}", record.reason);
        println!("message: {}", record.message);
        println!(
            "last_timestamp: {}",
            record
                .last_timestamp
                .map_or_else(|| "unknown".to_string(), |value| value.to_string())
        );
        println!();
    }
}
