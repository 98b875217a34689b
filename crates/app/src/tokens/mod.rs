//! Access tokens

mod errors;
pub mod matcher;
pub mod naming;
mod payload;
pub mod provisioner;
pub mod records;
mod repository;

pub use errors::ProvisionError;
pub use matcher::*;
pub use naming::{GENERATED_NAME_PREFIX, TokenNaming};
pub use payload::TokenPayload;
pub use provisioner::*;
pub use records::*;
pub use repository::*;
