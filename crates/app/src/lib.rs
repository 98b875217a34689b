//! Migration of SPI token secrets into access-token entities.
//!
//! Secrets labeled [`secrets::TOKEN_SECRET_LABEL`] carry either a reference to
//! an existing access token or a provider URL with raw credentials. The
//! [`migration`] service resolves or creates the access token, moves the
//! credentials into token [`storage`], deletes the secret and records failures
//! as [`diagnostics`] events keyed by the secret.

pub mod context;
pub mod diagnostics;
pub mod kube;
pub mod migration;
pub mod objects;
pub mod secrets;
pub mod storage;
pub mod tokens;

#[cfg(test)]
mod test;
