//! Token secret migration

mod errors;
pub mod service;

pub use errors::MigrationError;
pub use service::*;
