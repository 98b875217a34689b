//! Secrets repository.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    objects::{ObjectKey, RepositoryError, Scope},
    secrets::CandidateSecret,
};

#[automock]
#[async_trait]
/// Access to the secrets holding tokens to migrate.
pub trait SecretsRepository: Send + Sync {
    /// Lists the secrets in `scope` carrying `label`.
    async fn list_labeled(
        &self,
        scope: &Scope,
        label: &str,
    ) -> Result<Vec<CandidateSecret>, RepositoryError>;

    /// Deletes a secret.
    async fn delete(&self, key: &ObjectKey) -> Result<(), RepositoryError>;
}
