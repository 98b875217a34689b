//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    diagnostics::{DiagnosticsRepository, RecordErrorReporter},
    kube::{KubeClient, KubeConfig},
    migration::{DeletionOrder, MigrationParts, MigrationService, TokenMigrationService},
    objects::RepositoryError,
    secrets::SecretsRepository,
    storage::{OpenBaoConfig, OpenBaoTokenStorage, TokenStorage},
    tokens::{
        AccessTokensRepository, RepositoryTokenMatcher, RepositoryTokenProvisioner, TokenNaming,
    },
};

/// Errors raised while wiring the application context.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// The Kubernetes HTTP client could not be built.
    #[error("failed to build Kubernetes API client")]
    Kube(#[source] RepositoryError),
}

/// Migration policies chosen at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSettings {
    /// When candidate secrets are deleted.
    pub deletion: DeletionOrder,

    /// How created access tokens are named.
    pub naming: TokenNaming,
}

/// Services shared by the controller commands.
#[derive(Clone)]
pub struct AppContext {
    /// Token secret migration.
    pub migration: Arc<dyn MigrationService>,

    /// Recorded migration failures.
    pub diagnostics: Arc<dyn DiagnosticsRepository>,
}

impl AppContext {
    /// Build application context against a Kubernetes API server and OpenBao.
    ///
    /// # Errors
    ///
    /// Returns an error when the Kubernetes HTTP client cannot be built.
    pub fn from_kube(
        kube: KubeConfig,
        openbao: OpenBaoConfig,
        settings: MigrationSettings,
    ) -> Result<Self, AppInitError> {
        let cluster = KubeClient::new(kube).map_err(AppInitError::Kube)?;

        Ok(Self::from_parts(
            Arc::new(cluster),
            Arc::new(OpenBaoTokenStorage::new(openbao)),
            settings,
        ))
    }

    /// Wire the migration service over one object repository and a token storage.
    #[must_use]
    pub fn from_parts<R>(
        cluster: Arc<R>,
        storage: Arc<dyn TokenStorage>,
        settings: MigrationSettings,
    ) -> Self
    where
        R: SecretsRepository + AccessTokensRepository + DiagnosticsRepository + 'static,
    {
        let secrets: Arc<dyn SecretsRepository> = cluster.clone();
        let tokens: Arc<dyn AccessTokensRepository> = cluster.clone();
        let diagnostics: Arc<dyn DiagnosticsRepository> = cluster;

        let parts = MigrationParts {
            secrets,
            matcher: Arc::new(RepositoryTokenMatcher::new(tokens.clone())),
            provisioner: Arc::new(RepositoryTokenProvisioner::new(
                tokens.clone(),
                settings.naming,
            )),
            tokens,
            storage,
            reporter: Arc::new(RecordErrorReporter::new(diagnostics.clone())),
        };

        Self {
            migration: Arc::new(TokenMigrationService::new(parts, settings.deletion)),
            diagnostics,
        }
    }
}
