//! Matches provider URLs to existing access tokens.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::{
    objects::RepositoryError,
    tokens::{AccessToken, AccessTokensRepository},
};

/// Looks access tokens up through the access tokens repository.
#[derive(Clone)]
pub struct RepositoryTokenMatcher {
    tokens: Arc<dyn AccessTokensRepository>,
}

impl RepositoryTokenMatcher {
    /// Creates a matcher reading from `tokens`.
    #[must_use]
    pub fn new(tokens: Arc<dyn AccessTokensRepository>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenMatcher for RepositoryTokenMatcher {
    async fn find_by_provider(
        &self,
        namespace: &str,
        provider_url: &str,
    ) -> Result<Option<AccessToken>, RepositoryError> {
        let tokens = self.tokens.list(namespace).await?;

        Ok(tokens
            .into_iter()
            .find(|token| token.service_provider_url == provider_url))
    }
}

#[automock]
#[async_trait]
/// Finds existing access tokens for a provider.
pub trait TokenMatcher: Send + Sync {
    /// Finds the first access token in `namespace` bound to exactly
    /// `provider_url`.
    async fn find_by_provider(
        &self,
        namespace: &str,
        provider_url: &str,
    ) -> Result<Option<AccessToken>, RepositoryError>;
}
