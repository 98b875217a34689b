//! Access token provisioning errors.

use thiserror::Error;

use crate::objects::{ObjectKey, RepositoryError};

/// Reasons an access token could not be provisioned.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The repository refused the create.
    #[error("access token {0} was rejected")]
    Rejected(ObjectKey, #[source] RepositoryError),

    /// The derived name is taken by a token for another provider.
    #[error("access token {key} is already bound to {bound_to}")]
    Conflict {
        /// The contested name.
        key: ObjectKey,
        /// Provider the existing token is bound to.
        bound_to: String,
    },

    /// The name was taken, yet the existing token could not be found.
    #[error("access token {0} already exists but could not be read back")]
    Vanished(ObjectKey),
}
