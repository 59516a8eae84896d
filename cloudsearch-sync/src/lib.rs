//! # CloudSearch Sync
//!
//! Keeps a CloudSearch domain in sync with CMS content and answers structured
//! search queries against it.
//!
//! ## Architecture
//!
//! Content changes flow through a persistent queue:
//!
//! 1. **Queue**: Content edits are recorded as pending document changes
//! 2. **Sync**: A leased cycle packs the oldest changes into a batch and sends it
//! 3. **Sweep**: A watermark sweep re-queues the whole corpus one page at a time
//! 4. **Scheduler**: Drives sync cycles and sweep pages on timers
//!
//! ## Modules
//!
//! - [`config`]: Stores and dependency initialization
//! - [`domain`]: Domain creation, schema and access policy
//! - [`extensions`]: Schema and document field contributors
//! - [`query`]: Structured search requests
//! - [`queue`]: Pending document changes
//! - [`scheduler`]: Periodic triggers
//! - [`sweep`]: Queue-all sweep
//! - [`sync`]: Batch sync engine
//! - [`errors`]: Error types for the service

pub mod config;
pub mod domain;
pub mod errors;
pub mod extensions;
pub mod query;
pub mod queue;
pub mod scheduler;
pub mod sweep;
pub mod sync;

pub use config::{Dependencies, StartupOptions, Stores};
pub use domain::{DomainManager, DomainPollConfig};
pub use errors::SyncError;
pub use extensions::{DocumentFieldContributor, Extensions, SchemaContributor};
pub use query::{OrderBy, PrivateAccess, SearchRequest, SearchService};
pub use queue::UpdateQueue;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use sweep::{QueueAllSweep, SweepConfig, SweepOutcome};
pub use sync::{BatchSync, CycleOutcome, SyncConfig, SyncStatus};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync error.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
