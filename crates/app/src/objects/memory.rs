//! In-memory cluster (non-persistent).

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    diagnostics::{DiagnosticRecord, DiagnosticsRepository},
    objects::{ObjectKey, RepositoryError, Scope},
    secrets::{CandidateSecret, SecretsRepository},
    tokens::{AccessToken, AccessTokensRepository, NewAccessToken},
};

/// Secrets, access tokens and diagnostics held in process memory.
///
/// Access tokens list in creation order, mirroring a store that returns
/// objects in a stable, insertion-like order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCluster {
    state: Arc<RwLock<ClusterState>>,
}

#[derive(Debug, Default)]
struct ClusterState {
    secrets: BTreeMap<ObjectKey, CandidateSecret>,
    tokens: Vec<AccessToken>,
    diagnostics: BTreeMap<ObjectKey, DiagnosticRecord>,
}

impl InMemoryCluster {
    /// Creates an empty cluster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a secret.
    pub async fn insert_secret(&self, secret: CandidateSecret) {
        self.state
            .write()
            .await
            .secrets
            .insert(secret.key.clone(), secret);
    }

    /// Adds an access token without any duplicate check.
    pub async fn insert_token(&self, token: AccessToken) {
        self.state.write().await.tokens.push(token);
    }

    /// Adds or replaces a diagnostic record.
    pub async fn insert_diagnostic(&self, record: DiagnosticRecord) {
        self.state
            .write()
            .await
            .diagnostics
            .insert(record.key.clone(), record);
    }

    /// The secret stored under `key`.
    pub async fn secret(&self, key: &ObjectKey) -> Option<CandidateSecret> {
        self.state.read().await.secrets.get(key).cloned()
    }

    /// Every access token across all namespaces.
    pub async fn tokens(&self) -> Vec<AccessToken> {
        self.state.read().await.tokens.clone()
    }

    /// The diagnostic record stored under `key`.
    pub async fn diagnostic(&self, key: &ObjectKey) -> Option<DiagnosticRecord> {
        self.state.read().await.diagnostics.get(key).cloned()
    }
}

#[async_trait]
impl SecretsRepository for InMemoryCluster {
    async fn list_labeled(
        &self,
        scope: &Scope,
        label: &str,
    ) -> Result<Vec<CandidateSecret>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .secrets
            .values()
            .filter(|secret| scope.contains(&secret.key.namespace) && secret.has_label(label))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), RepositoryError> {
        self.state
            .write()
            .await
            .secrets
            .remove(key)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl AccessTokensRepository for InMemoryCluster {
    async fn list(&self, namespace: &str) -> Result<Vec<AccessToken>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .tokens
            .iter()
            .filter(|token| token.key.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<AccessToken>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .tokens
            .iter()
            .find(|token| token.key == *key)
            .cloned())
    }

    async fn create(&self, token: NewAccessToken) -> Result<AccessToken, RepositoryError> {
        let mut state = self.state.write().await;

        if state.tokens.iter().any(|existing| existing.key == token.key) {
            return Err(RepositoryError::AlreadyExists);
        }

        let token = AccessToken::from(token);
        state.tokens.push(token.clone());

        Ok(token)
    }
}

#[async_trait]
impl DiagnosticsRepository for InMemoryCluster {
    async fn list(&self, scope: &Scope) -> Result<Vec<DiagnosticRecord>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .diagnostics
            .values()
            .filter(|record| scope.contains(&record.key.namespace))
            .cloned()
            .collect())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<DiagnosticRecord>, RepositoryError> {
        Ok(self.diagnostic(key).await)
    }

    async fn create(&self, record: DiagnosticRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;

        if state.diagnostics.contains_key(&record.key) {
            return Err(RepositoryError::AlreadyExists);
        }

        state.diagnostics.insert(record.key.clone(), record);

        Ok(())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), RepositoryError> {
        self.state
            .write()
            .await
            .diagnostics
            .remove(key)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}
