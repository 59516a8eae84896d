//! In-memory store implementations.
//!
//! Used when no database is configured and throughout the test suites.

mod content_store;
mod lease_store;
mod queue_store;
mod settings_store;

pub use content_store::MemoryContentStore;
pub use lease_store::MemoryLeaseStore;
pub use queue_store::MemoryQueueStore;
pub use settings_store::MemorySettingsStore;
