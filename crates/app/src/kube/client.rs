//! HTTP client for the Kubernetes API server.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Certificate, Client, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    diagnostics::{DIAGNOSTIC_REASON, DiagnosticRecord, DiagnosticsRepository},
    kube::resources::{
        AccessTokenResource, EventResource, ObjectList, SecretResource,
    },
    objects::{ObjectKey, RepositoryError, Scope},
    secrets::{CandidateSecret, SecretsRepository},
    tokens::{ACCESS_TOKEN_API_VERSION, AccessToken, AccessTokensRepository, NewAccessToken},
};

/// Configuration for connecting to a Kubernetes API server.
#[derive(Clone)]
pub struct KubeConfig {
    /// API server address, e.g. `"https://kubernetes.default.svc"`.
    pub api_server: String,

    /// Bearer token of the service account.
    pub token: String,

    /// PEM bundle of the cluster CA, when it is not publicly trusted.
    pub ca_certificate_pem: Option<Vec<u8>>,

    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

impl fmt::Debug for KubeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeConfig")
            .field("api_server", &self.api_server)
            .field("token", &"**redacted**")
            .field("ca_certificate_pem", &self.ca_certificate_pem.is_some())
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Secrets, access tokens and events served by a Kubernetes API server.
#[derive(Clone)]
pub struct KubeClient {
    api_server: String,
    token: String,
    http: Client,
}

impl fmt::Debug for KubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeClient")
            .field("api_server", &self.api_server)
            .finish_non_exhaustive()
    }
}

impl KubeClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the CA bundle cannot be parsed or the HTTP
    /// client cannot be built.
    pub fn new(config: KubeConfig) -> Result<Self, RepositoryError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(pem) = &config.ca_certificate_pem {
            builder = builder.add_root_certificate(Certificate::from_pem(pem)?);
        }

        Ok(Self {
            api_server: config.api_server.trim_end_matches('/').to_string(),
            token: config.token,
            http: builder.build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_server)
    }

    /// GET a single object, `None` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, RepositoryError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(unexpected(response, "get").await),
        }
    }

    /// GET a collection. A missing collection means the resource type is not served.
    async fn list_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, RepositoryError> {
        self.get_json::<ObjectList<T>>(path, query)
            .await?
            .map(|list| list.items)
            .ok_or(RepositoryError::NotFound)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RepositoryError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::CONFLICT => Err(RepositoryError::AlreadyExists),
            status if status.is_success() => Ok(response.json().await?),
            _ => Err(unexpected(response, "create").await),
        }
    }

    async fn delete_object(&self, path: &str) -> Result<(), RepositoryError> {
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(RepositoryError::NotFound),
            status if status.is_success() => Ok(()),
            _ => Err(unexpected(response, "delete").await),
        }
    }
}

async fn unexpected(response: Response, action: &str) -> RepositoryError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    RepositoryError::UnexpectedResponse(format!(
        "{action} request failed with status {status}: {text}"
    ))
}

fn secrets_path(scope: &Scope) -> String {
    match scope {
        Scope::AllNamespaces => "/api/v1/secrets".to_string(),
        Scope::Namespace(namespace) => format!("/api/v1/namespaces/{namespace}/secrets"),
    }
}

fn secret_path(key: &ObjectKey) -> String {
    format!("/api/v1/namespaces/{}/secrets/{}", key.namespace, key.name)
}

fn access_tokens_path(namespace: &str) -> String {
    format!("/apis/{ACCESS_TOKEN_API_VERSION}/namespaces/{namespace}/spiaccesstokens")
}

fn access_token_path(key: &ObjectKey) -> String {
    format!("{}/{}", access_tokens_path(&key.namespace), key.name)
}

fn events_path(scope: &Scope) -> String {
    match scope {
        Scope::AllNamespaces => "/api/v1/events".to_string(),
        Scope::Namespace(namespace) => format!("/api/v1/namespaces/{namespace}/events"),
    }
}

fn event_path(key: &ObjectKey) -> String {
    format!("/api/v1/namespaces/{}/events/{}", key.namespace, key.name)
}

#[async_trait]
impl SecretsRepository for KubeClient {
    async fn list_labeled(
        &self,
        scope: &Scope,
        label: &str,
    ) -> Result<Vec<CandidateSecret>, RepositoryError> {
        let resources: Vec<SecretResource> = self
            .list_json(&secrets_path(scope), &[("labelSelector", label)])
            .await?;

        Ok(resources.into_iter().map(CandidateSecret::from).collect())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), RepositoryError> {
        self.delete_object(&secret_path(key)).await
    }
}

#[async_trait]
impl AccessTokensRepository for KubeClient {
    async fn list(&self, namespace: &str) -> Result<Vec<AccessToken>, RepositoryError> {
        let resources: Vec<AccessTokenResource> =
            self.list_json(&access_tokens_path(namespace), &[]).await?;

        Ok(resources.into_iter().map(AccessToken::from).collect())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<AccessToken>, RepositoryError> {
        Ok(self
            .get_json::<AccessTokenResource>(&access_token_path(key), &[])
            .await?
            .map(AccessToken::from))
    }

    async fn create(&self, token: NewAccessToken) -> Result<AccessToken, RepositoryError> {
        let path = access_tokens_path(&token.key.namespace);

        let created: AccessTokenResource = self
            .post_json(&path, &AccessTokenResource::from(token))
            .await?;

        Ok(created.into())
    }
}

#[async_trait]
impl DiagnosticsRepository for KubeClient {
    async fn list(&self, scope: &Scope) -> Result<Vec<DiagnosticRecord>, RepositoryError> {
        let selector = format!("reason={DIAGNOSTIC_REASON}");

        let resources: Vec<EventResource> = self
            .list_json(&events_path(scope), &[("fieldSelector", selector.as_str())])
            .await?;

        Ok(resources.into_iter().map(DiagnosticRecord::from).collect())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<DiagnosticRecord>, RepositoryError> {
        Ok(self
            .get_json::<EventResource>(&event_path(key), &[])
            .await?
            .map(DiagnosticRecord::from))
    }

    async fn create(&self, record: DiagnosticRecord) -> Result<(), RepositoryError> {
        let path = events_path(&Scope::Namespace(record.key.namespace.clone()));

        let created: EventResource = self.post_json(&path, &EventResource::from(record)).await?;

        debug!(event = %created.metadata.key(), "diagnostic event created");

        Ok(())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), RepositoryError> {
        self.delete_object(&event_path(key)).await
    }
}
