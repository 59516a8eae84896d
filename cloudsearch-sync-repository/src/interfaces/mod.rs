//! Interface definitions for remote services and persistence.
//!
//! Every collaborator of the sync engine sits behind one of these traits so the
//! engine can be wired against real backends or in-memory implementations.

mod config_api;
mod content_store;
mod document_service;
mod lease_store;
mod queue_store;
mod settings_store;

pub use config_api::{ConfigApi, OPEN_NETWORK};
pub use content_store::ContentStore;
pub use document_service::DocumentService;
pub use lease_store::LeaseStore;
pub use queue_store::QueueStore;
pub use settings_store::SettingsStore;
