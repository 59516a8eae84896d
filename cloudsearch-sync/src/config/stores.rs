//! Persistence backends shared by every component.

use std::sync::Arc;

use cloudsearch_sync_repository::{
    ContentStore, LeaseStore, MemoryContentStore, MemoryLeaseStore, MemoryQueueStore,
    MemorySettingsStore, PostgresContentStore, PostgresLeaseStore, PostgresQueueStore,
    PostgresSettingsStore, QueueStore, SettingsStore,
};

/// The four stores the sync service reads and writes.
#[derive(Clone)]
pub struct Stores {
    pub queue: Arc<dyn QueueStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub leases: Arc<dyn LeaseStore>,
    pub content: Arc<dyn ContentStore>,
}

impl Stores {
    /// Process-local stores with an empty content store.
    pub fn in_memory() -> Self {
        Self::in_memory_with_content(Arc::new(MemoryContentStore::new()))
    }

    /// Process-local stores reading content from `content`.
    pub fn in_memory_with_content(content: Arc<dyn ContentStore>) -> Self {
        Self {
            queue: Arc::new(MemoryQueueStore::new()),
            settings: Arc::new(MemorySettingsStore::new()),
            leases: Arc::new(MemoryLeaseStore::new()),
            content,
        }
    }

    /// Stores backed by one PostgreSQL pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            queue: Arc::new(PostgresQueueStore::new(pool.clone())),
            settings: Arc::new(PostgresSettingsStore::new(pool.clone())),
            leases: Arc::new(PostgresLeaseStore::new(pool.clone())),
            content: Arc::new(PostgresContentStore::new(pool)),
        }
    }
}
