//! Search document types.
//!
//! This module defines the document record that is packed into batches and
//! submitted to the remote document service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Language assigned to documents that do not carry one.
pub const DEFAULT_LANG: &str = "en";

/// A single document in the remote batch format.
///
/// The required attributes (`type`, `id`, `version`, `lang`) are fixed fields;
/// everything the content store contributes lives in `fields`.
///
/// # Fields
///
/// - `doc_type`: Batch operation for the document (`add` or `delete`), serialized as `type`
/// - `id`: Document identifier in the remote index
/// - `version`: Monotonic document version; newer versions replace older ones
/// - `lang`: Document language, defaulted to `en` when empty
/// - `fields`: Field values for `add` documents; omitted when empty
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
    pub version: u64,
    #[serde(default)]
    pub lang: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl SearchDocument {
    /// Create a document with no fields and an empty language.
    ///
    /// # Arguments
    ///
    /// * `doc_type` - The batch operation (`add` or `delete`)
    /// * `id` - The document identifier
    /// * `version` - The document version
    ///
    /// # Example
    ///
    /// ```
    /// use cloudsearch_sync_shared::SearchDocument;
    ///
    /// let doc = SearchDocument::new("add", "post_42", 1)
    ///     .with_field("post_title", "Hello");
    /// assert_eq!(doc.fields.len(), 1);
    /// ```
    pub fn new(doc_type: impl Into<String>, id: impl Into<String>, version: u64) -> Self {
        Self {
            doc_type: doc_type.into(),
            id: id.into(),
            version,
            lang: String::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field value, returning the document for chaining.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set the document language, returning the document for chaining.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Normalize the field map for submission.
    ///
    /// Field names are lowercased and `null` values become empty strings. Only the
    /// field map is touched; top-level attributes are left as they are.
    pub fn sanitize_fields(&mut self) {
        let fields = std::mem::take(&mut self.fields);
        self.fields = fields
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Null => Value::String(String::new()),
                    other => other,
                };
                (name.to_lowercase(), value)
            })
            .collect();
    }
}
