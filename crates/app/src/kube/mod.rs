//! Kubernetes API server adapter.

mod client;
mod resources;

pub use client::{KubeClient, KubeConfig};
