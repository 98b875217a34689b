//! OpenBao KV v2 token storage.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{
    storage::{TokenStorage, TokenStorageError},
    tokens::{AccessToken, TokenPayload},
};

/// Configuration for connecting to an OpenBao instance.
#[derive(Clone)]
pub struct OpenBaoConfig {
    /// OpenBao server address, e.g. `"http://localhost:8200"`.
    pub addr: String,

    /// Vault/OpenBao authentication token.
    pub token: String,

    /// Mount path of the KV v2 secrets engine.
    pub mount: String,

    /// Path prefix under which token payloads are written.
    pub path_prefix: String,
}

impl fmt::Debug for OpenBaoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenBaoConfig")
            .field("addr", &self.addr)
            .field("token", &"**redacted**")
            .field("mount", &self.mount)
            .field("path_prefix", &self.path_prefix)
            .finish()
    }
}

/// Stores token payloads as KV v2 secrets, one per access token.
#[derive(Debug, Clone)]
pub struct OpenBaoTokenStorage {
    config: OpenBaoConfig,
    http: Client,
}

impl OpenBaoTokenStorage {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: OpenBaoConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// KV v2 data URL holding the payload owned by `owner`.
    fn data_url(&self, owner: &AccessToken) -> String {
        let addr = self.config.addr.trim_end_matches('/');
        let mount = self.config.mount.trim_matches('/');
        let prefix = self.config.path_prefix.trim_matches('/');

        if prefix.is_empty() {
            format!(
                "{addr}/v1/{mount}/data/{}/{}",
                owner.key.namespace, owner.key.name
            )
        } else {
            format!(
                "{addr}/v1/{mount}/data/{prefix}/{}/{}",
                owner.key.namespace, owner.key.name
            )
        }
    }
}

#[async_trait]
impl TokenStorage for OpenBaoTokenStorage {
    async fn store(
        &self,
        owner: &AccessToken,
        payload: &TokenPayload,
    ) -> Result<(), TokenStorageError> {
        let url = self.data_url(owner);

        let body = serde_json::json!({
            "data": {
                "username": payload.username(),
                "access_token": payload.access_token(),
                "service_provider_url": owner.service_provider_url,
            }
        });

        let response = self
            .http
            .post(&url)
            .header("X-Vault-Token", &self.config.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(TokenStorageError::UnexpectedResponse(format!(
                "store request failed with status {status}: {text}"
            )));
        }

        debug!(access_token = %owner.key, "token payload written to OpenBao");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::objects::ObjectKey;

    use super::*;

    fn storage(prefix: &str) -> OpenBaoTokenStorage {
        OpenBaoTokenStorage::new(OpenBaoConfig {
            addr: "http://localhost:8200/".to_string(),
            token: "root".to_string(),
            mount: "secret".to_string(),
            path_prefix: prefix.to_string(),
        })
    }

    fn owner() -> AccessToken {
        AccessToken {
            key: ObjectKey::new("team-a", "generated-spi-access-token-abc"),
            service_provider_url: "https://github.com".to_string(),
        }
    }

    #[test]
    fn data_url_is_keyed_by_owner() {
        assert_eq!(
            storage("/spi/").data_url(&owner()),
            "http://localhost:8200/v1/secret/data/spi/team-a/generated-spi-access-token-abc"
        );
    }

    #[test]
    fn empty_prefix_is_omitted() {
        assert_eq!(
            storage("").data_url(&owner()),
            "http://localhost:8200/v1/secret/data/team-a/generated-spi-access-token-abc"
        );
    }
}
