//! Document update queue.
//!
//! [`UpdateQueue`] is a cycle-scoped accumulator over the queue ledger. Every
//! change notification for the same document mutates one in-memory record,
//! and [`UpdateQueue::flush`] persists the records that actually changed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use cloudsearch_sync_repository::QueueStore;
use cloudsearch_sync_shared::QueuedUpdate;

use crate::errors::SyncError;

/// Pending changes collected during one operation.
///
/// # Example
///
/// ```ignore
/// let mut queue = UpdateQueue::new(stores.queue.clone());
/// queue.queue_field_update("42", "post", "post_title").await?;
/// queue.queue_field_update("42", "post", "post_title").await?;
/// queue.flush().await?; // one ledger entry with one field
/// ```
pub struct UpdateQueue {
    store: Arc<dyn QueueStore>,
    pending: HashMap<(String, String), QueuedUpdate>,
}

impl UpdateQueue {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self {
            store,
            pending: HashMap::new(),
        }
    }

    /// The record for a document, loaded from the ledger on first touch.
    async fn record(
        &mut self,
        document_id: &str,
        document_type: &str,
    ) -> Result<&mut QueuedUpdate, SyncError> {
        let key = (document_type.to_string(), document_id.to_string());
        match self.pending.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let record = match self.store.find(document_type, document_id).await? {
                    Some(record) => record,
                    None => QueuedUpdate::new(document_type, document_id),
                };
                Ok(entry.insert(record))
            }
        }
    }

    /// Mark a field of a document as pending.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The field is pending
    /// * `Ok(false)` - The document is queued for deletion; nothing changed
    pub async fn queue_field_update(
        &mut self,
        document_id: &str,
        document_type: &str,
        field_name: &str,
    ) -> Result<bool, SyncError> {
        let record = self.record(document_id, document_type).await?;
        let queued = record.add_field(field_name);
        debug!(
            document_type = %document_type,
            document_id = %document_id,
            field = %field_name,
            queued = queued,
            "Field update queued"
        );
        Ok(queued)
    }

    /// Queue a document for deletion, discarding any pending field updates.
    pub async fn queue_deletion(
        &mut self,
        document_id: &str,
        document_type: &str,
    ) -> Result<(), SyncError> {
        let record = self.record(document_id, document_type).await?;
        record.set_for_deletion();
        debug!(
            document_type = %document_type,
            document_id = %document_id,
            "Deletion queued"
        );
        Ok(())
    }

    /// Mark every field in `fields` as pending.
    ///
    /// # Returns
    ///
    /// * `Ok(false)` - The document is queued for deletion; nothing changed
    pub async fn queue_full_document(
        &mut self,
        document_id: &str,
        document_type: &str,
        fields: &[String],
    ) -> Result<bool, SyncError> {
        let record = self.record(document_id, document_type).await?;
        let mut queued = true;
        for field in fields {
            queued &= record.add_field(field.as_str());
        }
        Ok(queued)
    }

    /// Persist every record that changed since it was loaded or last flushed.
    ///
    /// # Returns
    ///
    /// The number of records written.
    pub async fn flush(&mut self) -> Result<usize, SyncError> {
        let mut saved = 0;
        for record in self.pending.values_mut() {
            if record.has_changed() {
                self.store.save(record).await?;
                record.mark_saved();
                saved += 1;
            }
        }
        if saved > 0 {
            debug!(saved = saved, "Queue flushed");
        }
        Ok(saved)
    }

    /// Number of documents touched by this accumulator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
