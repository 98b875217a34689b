//! Access tokens repository.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    objects::{ObjectKey, RepositoryError},
    tokens::{AccessToken, NewAccessToken},
};

#[automock]
#[async_trait]
/// Access token metadata persistence.
pub trait AccessTokensRepository: Send + Sync {
    /// Lists the access tokens in `namespace`, in the store's listing order.
    async fn list(&self, namespace: &str) -> Result<Vec<AccessToken>, RepositoryError>;

    /// Retrieves a single access token, `None` when it does not exist.
    async fn get(&self, key: &ObjectKey) -> Result<Option<AccessToken>, RepositoryError>;

    /// Creates an access token.
    ///
    /// Fails with [`RepositoryError::AlreadyExists`] when the key is taken.
    async fn create(&self, token: NewAccessToken) -> Result<AccessToken, RepositoryError>;
}
