//! Provisions access tokens for providers without one.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{debug, info};

use crate::{
    objects::{ObjectKey, RepositoryError},
    tokens::{AccessToken, AccessTokensRepository, NewAccessToken, ProvisionError, TokenNaming},
};

/// Creates access tokens through the access tokens repository.
#[derive(Clone)]
pub struct RepositoryTokenProvisioner {
    tokens: Arc<dyn AccessTokensRepository>,
    naming: TokenNaming,
}

impl RepositoryTokenProvisioner {
    /// Creates a provisioner writing to `tokens` with the given naming.
    #[must_use]
    pub fn new(tokens: Arc<dyn AccessTokensRepository>, naming: TokenNaming) -> Self {
        Self { tokens, naming }
    }

    /// Resolve a create that lost to an existing token of the same derived name.
    async fn adopt_existing(
        &self,
        key: ObjectKey,
        provider_url: &str,
    ) -> Result<AccessToken, ProvisionError> {
        let existing = self
            .tokens
            .get(&key)
            .await
            .map_err(|source| ProvisionError::Rejected(key.clone(), source))?
            .ok_or_else(|| ProvisionError::Vanished(key.clone()))?;

        if existing.service_provider_url != provider_url {
            return Err(ProvisionError::Conflict {
                key,
                bound_to: existing.service_provider_url,
            });
        }

        debug!(access_token = %existing.key, "adopted concurrently created access token");

        Ok(existing)
    }
}

#[async_trait]
impl TokenProvisioner for RepositoryTokenProvisioner {
    async fn create_for(
        &self,
        provider_url: &str,
        namespace: &str,
    ) -> Result<AccessToken, ProvisionError> {
        let key = ObjectKey::new(namespace, self.naming.name_for(namespace, provider_url));

        let created = self
            .tokens
            .create(NewAccessToken {
                key: key.clone(),
                service_provider_url: provider_url.to_string(),
            })
            .await;

        match created {
            Ok(token) => {
                info!(access_token = %token.key, provider_url, "access token created");

                Ok(token)
            }
            Err(RepositoryError::AlreadyExists) if self.naming == TokenNaming::Derived => {
                self.adopt_existing(key, provider_url).await
            }
            Err(source) => Err(ProvisionError::Rejected(key, source)),
        }
    }
}

#[automock]
#[async_trait]
/// Creates access tokens for providers that have none.
pub trait TokenProvisioner: Send + Sync {
    /// Creates a new access token in `namespace` bound to `provider_url`.
    async fn create_for(
        &self,
        provider_url: &str,
        namespace: &str,
    ) -> Result<AccessToken, ProvisionError>;
}
