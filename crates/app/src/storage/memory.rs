//! In-memory token storage (non-persistent).

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    objects::ObjectKey,
    storage::{TokenStorage, TokenStorageError},
    tokens::{AccessToken, TokenPayload},
};

/// Keeps payloads in process memory and counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStorage {
    state: Arc<RwLock<StoredTokens>>,
}

#[derive(Debug, Default)]
struct StoredTokens {
    payloads: BTreeMap<ObjectKey, TokenPayload>,
    writes: usize,
}

impl MemoryTokenStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload currently stored for the access token `owner`.
    pub async fn payload(&self, owner: &ObjectKey) -> Option<TokenPayload> {
        self.state.read().await.payloads.get(owner).cloned()
    }

    /// Number of successful `store` calls so far.
    pub async fn writes(&self) -> usize {
        self.state.read().await.writes
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn store(
        &self,
        owner: &AccessToken,
        payload: &TokenPayload,
    ) -> Result<(), TokenStorageError> {
        let mut state = self.state.write().await;

        state.payloads.insert(owner.key.clone(), payload.clone());
        state.writes += 1;

        Ok(())
    }
}
