//! Reports migration failures as diagnostic records.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{debug, error, warn};

use crate::{
    diagnostics::{DiagnosticRecord, DiagnosticsRepository},
    objects::ObjectKey,
    secrets::CandidateSecret,
};

/// Keeps at most one diagnostic record per secret in the diagnostics repository.
#[derive(Clone)]
pub struct RecordErrorReporter {
    diagnostics: Arc<dyn DiagnosticsRepository>,
}

impl RecordErrorReporter {
    /// Creates a reporter writing to `diagnostics`.
    #[must_use]
    pub fn new(diagnostics: Arc<dyn DiagnosticsRepository>) -> Self {
        Self { diagnostics }
    }
}

#[async_trait]
impl ErrorReporter for RecordErrorReporter {
    async fn report(&self, secret: &CandidateSecret, message: &str) {
        self.clear(&secret.key).await;

        // Best effort: the migration failure stays the error that matters.
        if let Err(source) = self
            .diagnostics
            .create(DiagnosticRecord::for_secret(secret, message))
            .await
        {
            error!(secret = %secret.key, "failed to record diagnostic: {source}");
        }
    }

    async fn clear(&self, key: &ObjectKey) {
        let existing = match self.diagnostics.get(key).await {
            Ok(Some(existing)) => existing,
            Ok(None) => return,
            Err(source) => {
                warn!(secret = %key, "failed to look up diagnostic: {source}");
                return;
            }
        };

        debug!(secret = %key, "deleting stale diagnostic");

        if let Err(source) = self.diagnostics.delete(&existing.key).await {
            error!(secret = %key, "failed to delete diagnostic: {source}");
        }
    }
}

#[automock]
#[async_trait]
/// Records and clears per-secret migration failures.
pub trait ErrorReporter: Send + Sync {
    /// Replaces any diagnostic for `secret` with one carrying `message`.
    async fn report(&self, secret: &CandidateSecret, message: &str);

    /// Removes the diagnostic for the secret `key`, if any.
    async fn clear(&self, key: &ObjectKey);
}
