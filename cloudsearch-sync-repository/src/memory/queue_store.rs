use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cloudsearch_sync_shared::{QueueKey, QueuedUpdate};

use crate::errors::StoreError;
use crate::interfaces::QueueStore;

type DocumentKey = (String, String);

/// Queue ledger held in a map keyed by document type and id.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    records: RwLock<HashMap<DocumentKey, QueuedUpdate>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn find(
        &self,
        document_type: &str,
        document_id: &str,
    ) -> Result<Option<QueuedUpdate>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(document_type.to_string(), document_id.to_string()))
            .cloned())
    }

    async fn save(&self, update: &QueuedUpdate) -> Result<(), StoreError> {
        let key = (update.document_type.clone(), update.document_id.clone());
        let mut stored = update.clone();
        stored.mark_saved();

        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&key) {
            stored.created_at = existing.created_at;
        }
        records.insert(key, stored);
        Ok(())
    }

    async fn oldest(&self, limit: usize) -> Result<Vec<QueuedUpdate>, StoreError> {
        let records = self.records.read().await;
        let mut all: Vec<QueuedUpdate> = records.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.storage_name().cmp(&b.storage_name()))
        });
        all.truncate(limit);
        Ok(all)
    }

    async fn delete(&self, keys: &[QueueKey]) -> Result<usize, StoreError> {
        let mut records = self.records.write().await;
        let mut deleted = 0;
        for key in keys {
            let document_key = (key.document_type.clone(), key.document_id.clone());
            if records
                .get(&document_key)
                .is_some_and(|record| record.revision == key.revision)
            {
                records.remove(&document_key);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.write().await.clear();
        Ok(())
    }
}
