//! Queue ledger trait definition.

use async_trait::async_trait;

use cloudsearch_sync_shared::{QueueKey, QueuedUpdate};

use crate::errors::StoreError;

/// Durable ledger of pending document changes.
///
/// There is at most one entry per `(document_type, document_id)`.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Look up the pending entry for a document.
    async fn find(
        &self,
        document_type: &str,
        document_id: &str,
    ) -> Result<Option<QueuedUpdate>, StoreError>;

    /// Insert an entry or replace the existing one for the same document.
    ///
    /// A replaced entry keeps its original `created_at`, so an updated document
    /// does not lose its place in the queue.
    async fn save(&self, update: &QueuedUpdate) -> Result<(), StoreError>;

    /// The `limit` oldest entries, oldest first.
    async fn oldest(&self, limit: usize) -> Result<Vec<QueuedUpdate>, StoreError>;

    /// Delete entries whose key and revision both match.
    ///
    /// An entry that was saved again after `keys` were read has a new revision
    /// and is left in place.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of entries deleted
    async fn delete(&self, keys: &[QueueKey]) -> Result<usize, StoreError>;

    /// Number of pending entries.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), StoreError>;
}
