use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::interfaces::ContentStore;
use crate::types::ContentItem;

#[derive(Debug, Clone)]
struct ContentRecord {
    created_at: DateTime<Utc>,
    fields: BTreeMap<String, Value>,
}

/// Content held in a map keyed by document type and id.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    records: RwLock<HashMap<(String, String), ContentRecord>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub async fn upsert(
        &self,
        document_type: &str,
        document_id: &str,
        created_at: DateTime<Utc>,
        fields: BTreeMap<String, Value>,
    ) {
        self.records.write().await.insert(
            (document_type.to_string(), document_id.to_string()),
            ContentRecord { created_at, fields },
        );
    }

    /// Remove a document.
    pub async fn remove(&self, document_type: &str, document_id: &str) {
        self.records
            .write()
            .await
            .remove(&(document_type.to_string(), document_id.to_string()));
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch_fields(
        &self,
        document_type: &str,
        document_id: &str,
        fields: &[String],
    ) -> Result<Option<BTreeMap<String, Value>>, StoreError> {
        let records = self.records.read().await;
        let Some(record) = records.get(&(document_type.to_string(), document_id.to_string()))
        else {
            return Ok(None);
        };

        Ok(Some(
            fields
                .iter()
                .map(|field| {
                    let value = record.fields.get(field).cloned().unwrap_or(Value::Null);
                    (field.clone(), value)
                })
                .collect(),
        ))
    }

    async fn page_before(
        &self,
        document_types: &[String],
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let records = self.records.read().await;
        let mut items: Vec<ContentItem> = records
            .iter()
            .filter(|((document_type, _), record)| {
                document_types.contains(document_type) && record.created_at < before
            })
            .map(|((document_type, document_id), record)| ContentItem {
                document_type: document_type.clone(),
                document_id: document_id.clone(),
                created_at: record.created_at,
            })
            .collect();

        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        items.truncate(limit);
        Ok(items)
    }
}
