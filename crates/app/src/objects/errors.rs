//! Object repository errors.

use thiserror::Error;

/// Errors raised by object repository adapters.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The addressed object does not exist.
    #[error("object not found")]
    NotFound,

    /// An object with the same key already exists.
    #[error("object already exists")]
    AlreadyExists,

    /// An HTTP transport or serialization error occurred.
    #[error("http error")]
    Http(#[from] reqwest::Error),

    /// The API server answered with a non-2xx status or an unexpected body.
    #[error("unexpected response from the API server: {0}")]
    UnexpectedResponse(String),
}
