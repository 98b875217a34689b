//! Token storage

use async_trait::async_trait;
use mockall::automock;

use crate::tokens::{AccessToken, TokenPayload};

mod errors;
pub mod memory;
pub mod openbao;

pub use errors::TokenStorageError;
pub use memory::MemoryTokenStorage;
pub use openbao::{OpenBaoConfig, OpenBaoTokenStorage};

#[automock]
#[async_trait]
/// Durable storage for token credentials, keyed by the owning access token.
pub trait TokenStorage: Send + Sync {
    /// Stores `payload` for `owner`, replacing any previous payload.
    async fn store(&self, owner: &AccessToken, payload: &TokenPayload)
    -> Result<(), TokenStorageError>;
}
