//! Diagnostic Records

use jiff::Timestamp;

use crate::{objects::ObjectKey, secrets::CandidateSecret};

/// Reason attached to every diagnostic record written by the migration.
pub const DIAGNOSTIC_REASON: &str = "SPITokenMigrationFailed";

/// Record type of migration diagnostics.
pub const DIAGNOSTIC_TYPE: &str = "Error";

/// Back-reference to the secret a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvolvedObject {
    /// Kind of the secret object.
    pub kind: String,

    /// API version of the secret object.
    pub api_version: String,

    /// Namespace of the secret.
    pub namespace: String,

    /// Name of the secret.
    pub name: String,
}

/// A failure note keyed by the originating secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Record identity; always equal to the secret's key.
    pub key: ObjectKey,

    /// Machine-readable reason.
    pub reason: String,

    /// Human-readable failure description.
    pub message: String,

    /// Record type, e.g. `Error`.
    pub record_type: String,

    /// The secret this record is about.
    pub involved_object: InvolvedObject,

    /// When the failure was last observed.
    pub last_timestamp: Option<Timestamp>,
}

impl DiagnosticRecord {
    /// Build a fresh record describing a failure of `secret`.
    #[must_use]
    pub fn for_secret(secret: &CandidateSecret, message: impl Into<String>) -> Self {
        Self {
            key: secret.key.clone(),
            reason: DIAGNOSTIC_REASON.to_string(),
            message: message.into(),
            record_type: DIAGNOSTIC_TYPE.to_string(),
            involved_object: InvolvedObject {
                kind: secret.kind.clone(),
                api_version: secret.api_version.clone(),
                namespace: secret.key.namespace.clone(),
                name: secret.key.name.clone(),
            },
            last_timestamp: Some(Timestamp::now()),
        }
    }
}
