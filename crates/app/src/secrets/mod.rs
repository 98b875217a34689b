//! Token secrets awaiting migration

pub mod candidate;
mod repository;

pub use candidate::*;
pub use repository::*;
