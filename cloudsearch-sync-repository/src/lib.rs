//! # CloudSearch Sync Repository
//!
//! This crate provides everything the sync system uses to talk to the outside
//! world: the SigV4 request signer, the configuration API and document service
//! clients, and the persistence interfaces (queue ledger, settings, leases,
//! content) with in-memory and PostgreSQL implementations.

pub mod aws;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod types;

pub use aws::{
    CloudSearchConfigClient, CloudSearchDocumentClient, Credentials, FormPayload, RequestSigner,
};
pub use config::ClientConfig;
pub use errors::{CloudSearchError, StoreError};
pub use interfaces::{
    ConfigApi, ContentStore, DocumentService, LeaseStore, QueueStore, SettingsStore,
};
pub use memory::{MemoryContentStore, MemoryLeaseStore, MemoryQueueStore, MemorySettingsStore};
pub use postgres::{
    run_migrations, PostgresContentStore, PostgresLeaseStore, PostgresQueueStore,
    PostgresSettingsStore,
};
pub use types::{
    settings_keys, AccessPoliciesStatus, AccessPolicy, AccessPolicyStatement, BatchMessage,
    BatchResponse, ContentItem, IndexFieldStatus, RemoteError,
};
