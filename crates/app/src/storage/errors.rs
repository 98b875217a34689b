//! Token storage errors.

use thiserror::Error;

/// Errors that can occur while storing token payloads.
#[derive(Debug, Error)]
pub enum TokenStorageError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error")]
    Http(#[from] reqwest::Error),

    /// The storage backend returned a non-2xx response or unexpected body.
    #[error("unexpected response from token storage: {0}")]
    UnexpectedResponse(String),
}
