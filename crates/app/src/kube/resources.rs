//! Wire representations of the Kubernetes objects the migration touches.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    diagnostics::{DiagnosticRecord, InvolvedObject},
    objects::ObjectKey,
    secrets::CandidateSecret,
    tokens::{ACCESS_TOKEN_API_VERSION, ACCESS_TOKEN_KIND, AccessToken, NewAccessToken},
};

const EVENT_API_VERSION: &str = "v1";
const EVENT_KIND: &str = "Event";
const EVENT_SOURCE_COMPONENT: &str = "spi-migration-controller";
const KUBE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub(crate) fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.as_str(), self.name.as_str())
    }
}

impl From<&ObjectKey> for ObjectMeta {
    fn from(key: &ObjectKey) -> Self {
        Self {
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            labels: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecretResource {
    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    pub metadata: ObjectMeta,

    /// Base64-encoded values.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl From<SecretResource> for CandidateSecret {
    fn from(resource: SecretResource) -> Self {
        let key = resource.metadata.key();
        let mut secret = Self::new(key);

        // List responses usually omit these; keep the defaults then.
        if let Some(kind) = resource.kind.filter(|kind| !kind.is_empty()) {
            secret.kind = kind;
        }
        if let Some(api_version) = resource.api_version.filter(|version| !version.is_empty()) {
            secret.api_version = api_version;
        }

        secret.labels = resource.metadata.labels;

        // Undecodable values are kept as markers so the migration can diagnose them.
        for (field, encoded) in resource.data {
            match BASE64.decode(encoded.as_bytes()) {
                Ok(decoded) => {
                    secret.data.insert(field, decoded);
                }
                Err(_invalid) => {
                    secret.undecodable.insert(field);
                }
            }
        }

        secret
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenSpec {
    #[serde(default)]
    pub service_provider_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenResource {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: AccessTokenSpec,
}

impl From<NewAccessToken> for AccessTokenResource {
    fn from(token: NewAccessToken) -> Self {
        Self {
            api_version: ACCESS_TOKEN_API_VERSION.to_string(),
            kind: ACCESS_TOKEN_KIND.to_string(),
            metadata: ObjectMeta::from(&token.key),
            spec: AccessTokenSpec {
                service_provider_url: token.service_provider_url,
            },
        }
    }
}

impl From<AccessTokenResource> for AccessToken {
    fn from(resource: AccessTokenResource) -> Self {
        Self {
            key: resource.metadata.key(),
            service_provider_url: resource.spec.service_provider_url,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectReference {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct EventSource {
    #[serde(default)]
    pub component: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventResource {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    pub metadata: ObjectMeta,

    #[serde(default)]
    pub involved_object: ObjectReference,

    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub message: String,

    #[serde(rename = "type", default)]
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
}

impl From<DiagnosticRecord> for EventResource {
    fn from(record: DiagnosticRecord) -> Self {
        let timestamp = record
            .last_timestamp
            .map(|timestamp| timestamp.strftime(KUBE_TIME_FORMAT).to_string());

        Self {
            api_version: EVENT_API_VERSION.to_string(),
            kind: EVENT_KIND.to_string(),
            metadata: ObjectMeta::from(&record.key),
            involved_object: ObjectReference {
                kind: record.involved_object.kind,
                api_version: record.involved_object.api_version,
                namespace: record.involved_object.namespace,
                name: record.involved_object.name,
            },
            reason: record.reason,
            message: record.message,
            event_type: record.record_type,
            first_timestamp: timestamp.clone(),
            last_timestamp: timestamp,
            source: Some(EventSource {
                component: EVENT_SOURCE_COMPONENT.to_string(),
            }),
        }
    }
}

impl From<EventResource> for DiagnosticRecord {
    fn from(resource: EventResource) -> Self {
        Self {
            key: resource.metadata.key(),
            reason: resource.reason,
            message: resource.message,
            record_type: resource.event_type,
            involved_object: InvolvedObject {
                kind: resource.involved_object.kind,
                api_version: resource.involved_object.api_version,
                namespace: resource.involved_object.namespace,
                name: resource.involved_object.name,
            },
            last_timestamp: resource
                .last_timestamp
                .and_then(|raw| raw.parse::<Timestamp>().ok()),
        }
    }
}
