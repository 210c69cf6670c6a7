pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    CategoriesDocument, CategoryStore, ReplaceOutcome, Resource, StoreError, StoreMaintenance, TaskStore,
};

/// Both persistence collaborators, backed by the same store instance
#[derive(Clone)]
pub struct Stores {
    pub tasks: Arc<dyn TaskStore>,
    pub categories: Arc<dyn CategoryStore>,
}

impl Stores {
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        match config.store.backend {
            StoreBackend::Postgres => Ok(Self::shared(Arc::new(PgStore::from_config(config)?))),
            StoreBackend::Memory => Ok(Self::shared(Arc::new(MemoryStore::new()))),
        }
    }

    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: TaskStore + CategoryStore + 'static,
    {
        Self {
            tasks: store.clone(),
            categories: store,
        }
    }
}
