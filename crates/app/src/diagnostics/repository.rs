//! Diagnostics repository.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    diagnostics::DiagnosticRecord,
    objects::{ObjectKey, RepositoryError, Scope},
};

#[automock]
#[async_trait]
/// Diagnostic record persistence.
pub trait DiagnosticsRepository: Send + Sync {
    /// Lists the migration diagnostics in `scope`.
    async fn list(&self, scope: &Scope) -> Result<Vec<DiagnosticRecord>, RepositoryError>;

    /// Retrieves the record for a secret, `None` when there is none.
    async fn get(&self, key: &ObjectKey) -> Result<Option<DiagnosticRecord>, RepositoryError>;

    /// Creates a record.
    async fn create(&self, record: DiagnosticRecord) -> Result<(), RepositoryError>;

    /// Deletes a record.
    async fn delete(&self, key: &ObjectKey) -> Result<(), RepositoryError>;
}
