//! Content store trait definition.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::errors::StoreError;
use crate::types::ContentItem;

/// Read access to the CMS content being indexed.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Current values of the requested fields of a document.
    ///
    /// Fields the document does not have are returned as `null`.
    ///
    /// # Arguments
    ///
    /// * `document_type` - The content type (e.g. `post`)
    /// * `document_id` - The content identifier
    /// * `fields` - Field names to read
    ///
    /// # Returns
    ///
    /// * `Ok(Some(fields))` - The document exists
    /// * `Ok(None)` - The document no longer exists
    async fn fetch_fields(
        &self,
        document_type: &str,
        document_id: &str,
        fields: &[String],
    ) -> Result<Option<BTreeMap<String, Value>>, StoreError>;

    /// A page of documents created strictly before `before`, newest first.
    async fn page_before(
        &self,
        document_types: &[String],
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError>;
}
