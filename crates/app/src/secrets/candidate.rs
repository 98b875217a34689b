//! Candidate secrets and the migration source they describe.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Debug, Formatter},
};

use thiserror::Error;

use crate::{objects::ObjectKey, tokens::TokenPayload};

/// Label marking a secret as a token waiting to be migrated.
pub const TOKEN_SECRET_LABEL: &str = "spi.appstudio.redhat.com/token";

/// Data key naming an existing access token.
pub const SPI_TOKEN_NAME_KEY: &str = "spiTokenName";

/// Data key holding the service provider URL.
pub const PROVIDER_URL_KEY: &str = "providerUrl";

/// Data key holding the username.
pub const USER_NAME_KEY: &str = "userName";

/// Data key holding the raw access token.
pub const TOKEN_DATA_KEY: &str = "tokenData";

const DEFAULT_KIND: &str = "Secret";
const DEFAULT_API_VERSION: &str = "v1";

/// A labeled secret carrying credentials to migrate.
#[derive(Clone, PartialEq, Eq)]
pub struct CandidateSecret {
    /// Secret identity.
    pub key: ObjectKey,

    /// Object kind, used for diagnostic back-references.
    pub kind: String,

    /// Object API version, used for diagnostic back-references.
    pub api_version: String,

    /// Secret labels.
    pub labels: BTreeMap<String, String>,

    /// Raw secret data.
    pub data: BTreeMap<String, Vec<u8>>,

    /// Data keys whose stored value could not be decoded.
    pub undecodable: BTreeSet<String>,
}

/// Where the access token for a candidate comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSource {
    /// An existing access token, named explicitly.
    TokenReference(String),

    /// Whichever access token is bound to this provider URL.
    ProviderUrl(String),
}

/// Why a candidate's data cannot be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    /// Neither an access token name nor a provider URL is present.
    #[error("neither spiTokenName nor providerUrl key found")]
    MissingSource,

    /// The stored value of a data key is not valid base64.
    #[error("value of {0} is not valid base64")]
    Undecodable(String),

    /// The value of a data key is not valid UTF-8.
    #[error("value of {0} is not valid UTF-8")]
    InvalidUtf8(String),
}

impl CandidateSecret {
    /// A secret with no labels or data and the default kind and API version.
    #[must_use]
    pub fn new(key: ObjectKey) -> Self {
        Self {
            key,
            kind: DEFAULT_KIND.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            labels: BTreeMap::new(),
            data: BTreeMap::new(),
            undecodable: BTreeSet::new(),
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(label.into(), value.into());
        self
    }

    /// Adds a data entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Whether the secret carries `label`, whatever its value.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains_key(label)
    }

    /// Parse the migration source.
    ///
    /// A key only counts when its value is non-empty. An explicit token
    /// reference wins over a provider URL.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateError::MissingSource`] when neither key is present,
    /// or an encoding error when the deciding value cannot be read.
    pub fn source(&self) -> Result<MigrationSource, CandidateError> {
        if let Some(name) = self.value(SPI_TOKEN_NAME_KEY)? {
            return Ok(MigrationSource::TokenReference(name));
        }

        self.value(PROVIDER_URL_KEY)?
            .map(MigrationSource::ProviderUrl)
            .ok_or(CandidateError::MissingSource)
    }

    /// Extract the credential pair. Missing fields become empty strings.
    ///
    /// # Errors
    ///
    /// Returns an encoding error when a credential value cannot be read
    /// exactly as stored.
    pub fn payload(&self) -> Result<TokenPayload, CandidateError> {
        Ok(TokenPayload::new(
            self.value(USER_NAME_KEY)?.unwrap_or_default(),
            self.value(TOKEN_DATA_KEY)?.unwrap_or_default(),
        ))
    }

    fn value(&self, key: &str) -> Result<Option<String>, CandidateError> {
        if self.undecodable.contains(key) {
            return Err(CandidateError::Undecodable(key.to_string()));
        }

        let Some(raw) = self.data.get(key).filter(|value| !value.is_empty()) else {
            return Ok(None);
        };

        String::from_utf8(raw.clone())
            .map(Some)
            .map_err(|_invalid| CandidateError::InvalidUtf8(key.to_string()))
    }
}

impl Debug for CandidateSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateSecret")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("api_version", &self.api_version)
            .field("labels", &self.labels)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .field("undecodable", &self.undecodable)
            .finish()
    }
}
