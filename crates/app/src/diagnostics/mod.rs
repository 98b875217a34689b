//! Migration diagnostics

pub mod records;
mod reporter;
mod repository;

pub use records::*;
pub use reporter::*;
pub use repository::*;
