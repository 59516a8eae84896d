//! Extension points.
//!
//! Third parties adjust the index schema and the shape of outgoing documents
//! by registering contributors. Contributors run synchronously, in
//! registration order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use cloudsearch_sync_shared::IndexField;

/// Adds or alters index fields before the schema is applied.
pub trait SchemaContributor: Send + Sync {
    fn contribute(&self, schema: &mut Vec<IndexField>);
}

/// Adds or alters the fields of a document before it is packed into a batch.
pub trait DocumentFieldContributor: Send + Sync {
    /// # Arguments
    ///
    /// * `document_type` - Type of the document being built
    /// * `document_id` - Id of the document in the content store
    /// * `changed_fields` - Fields queued as changed for this document
    /// * `fields` - Field values read from the content store, to be edited in place
    fn contribute(
        &self,
        document_type: &str,
        document_id: &str,
        changed_fields: &BTreeSet<String>,
        fields: &mut BTreeMap<String, Value>,
    );
}

/// Ordered registry of contributors.
#[derive(Clone, Default)]
pub struct Extensions {
    schema: Vec<Arc<dyn SchemaContributor>>,
    document_fields: Vec<Arc<dyn DocumentFieldContributor>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_schema_contributor(&mut self, contributor: Arc<dyn SchemaContributor>) {
        self.schema.push(contributor);
    }

    pub fn register_document_field_contributor(
        &mut self,
        contributor: Arc<dyn DocumentFieldContributor>,
    ) {
        self.document_fields.push(contributor);
    }

    /// Run every schema contributor over `base`.
    pub fn schema(&self, base: Vec<IndexField>) -> Vec<IndexField> {
        let mut schema = base;
        for contributor in &self.schema {
            contributor.contribute(&mut schema);
        }
        schema
    }

    /// Run every document field contributor over `fields`.
    pub fn document_fields(
        &self,
        document_type: &str,
        document_id: &str,
        changed_fields: &BTreeSet<String>,
        fields: &mut BTreeMap<String, Value>,
    ) {
        for contributor in &self.document_fields {
            contributor.contribute(document_type, document_id, changed_fields, fields);
        }
    }
}
