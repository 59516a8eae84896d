//! Error types for the sync service.

use thiserror::Error;

use cloudsearch_sync_repository::{CloudSearchError, StoreError};
use cloudsearch_sync_shared::BatchError;

/// Errors that can occur while queueing, syncing or managing the domain.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A persistence store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A remote API call failed.
    #[error("Remote error: {0}")]
    Remote(#[from] CloudSearchError),

    /// A document could not be added to a batch.
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// The service is misconfigured or asked to do something invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure came from rejected credentials.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_authentication())
    }
}
