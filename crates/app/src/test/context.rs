//! Test context for service-level tests.

use std::sync::Arc;

use crate::{
    context::{AppContext, MigrationSettings},
    migration::{DeletionOrder, MigrationService},
    objects::memory::InMemoryCluster,
    storage::MemoryTokenStorage,
    tokens::TokenNaming,
};

pub(crate) struct TestContext {
    pub cluster: InMemoryCluster,
    pub storage: MemoryTokenStorage,
    pub migration: Arc<dyn MigrationService>,
}

impl TestContext {
    /// Context with the default policies.
    pub fn new() -> Self {
        Self::with_settings(MigrationSettings::default())
    }

    /// Context that deletes candidates before processing them.
    pub fn eager() -> Self {
        Self::with_settings(MigrationSettings {
            deletion: DeletionOrder::Eager,
            naming: TokenNaming::Random,
        })
    }

    pub fn with_settings(settings: MigrationSettings) -> Self {
        let cluster = InMemoryCluster::new();
        let storage = MemoryTokenStorage::new();

        let app = AppContext::from_parts(
            Arc::new(cluster.clone()),
            Arc::new(storage.clone()),
            settings,
        );

        Self {
            cluster,
            storage,
            migration: app.migration,
        }
    }
}
