//! Migration errors.

use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    objects::{ObjectKey, RepositoryError},
    secrets::CandidateError,
    storage::TokenStorageError,
    tokens::ProvisionError,
};

/// Failures of a migration pass or of a single secret within it.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The labeled secrets could not be listed.
    #[error("can not list token secrets")]
    ListingFailure(#[source] RepositoryError),

    /// The secret's data cannot be migrated as it stands.
    #[error("secret {key} is invalid")]
    MalformedCandidate {
        /// The offending secret.
        key: ObjectKey,
        /// What is wrong with its data.
        #[source]
        source: CandidateError,
    },

    /// The secret names an access token that does not exist.
    #[error("can not find SPI access token {0}")]
    UnresolvedReference(ObjectKey),

    /// Access tokens in the secret's namespace could not be read.
    #[error("can not look up SPI access tokens in namespace {namespace}")]
    LookupFailure {
        /// Namespace that was searched.
        namespace: String,
        /// Repository failure.
        #[source]
        source: RepositoryError,
    },

    /// No access token could be created for the provider.
    #[error("can not create SPI access token for {provider_url}")]
    ProvisionFailure {
        /// Provider the token would have been bound to.
        provider_url: String,
        /// Provisioning failure.
        #[source]
        source: ProvisionError,
    },

    /// The credentials could not be written to token storage.
    #[error("can not store token for SPI access token {owner}")]
    StoreFailure {
        /// Access token owning the payload.
        owner: ObjectKey,
        /// Storage failure.
        #[source]
        source: TokenStorageError,
    },

    /// The secret could not be deleted.
    #[error("can not delete secret {key}")]
    DeleteFailure {
        /// The secret that is still in place.
        key: ObjectKey,
        /// Repository failure.
        #[source]
        source: RepositoryError,
    },
}

impl MigrationError {
    /// Fatal errors end the batch instead of being recorded as diagnostics.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ListingFailure(_) | Self::DeleteFailure { .. })
    }

    /// The error and its sources, joined for a diagnostic message.
    #[must_use]
    pub fn diagnostic_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();

        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        message
    }
}
