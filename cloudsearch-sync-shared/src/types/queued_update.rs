//! Pending-change ledger records.
//!
//! A [`QueuedUpdate`] tracks everything that still has to be sent to the remote
//! index for one document: either a set of changed field names (`add`) or a
//! tombstone (`delete`).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the remote index should do with a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentAction {
    #[default]
    Add,
    Delete,
}

impl DocumentAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for DocumentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown document action: {}", other)),
        }
    }
}

/// Identifies one persisted revision of a queued update.
///
/// Deleting by key and revision means an entry that was updated after it was
/// fetched for a batch survives the batch's cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueKey {
    pub document_type: String,
    pub document_id: String,
    pub revision: Uuid,
}

/// A document's pending change.
///
/// Invariant: when `action` is [`DocumentAction::Delete`], `fields` is empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedUpdate {
    pub document_type: String,
    pub document_id: String,
    pub action: DocumentAction,
    pub fields: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub revision: Uuid,
    #[serde(skip)]
    has_changed: bool,
}

impl QueuedUpdate {
    /// Create a new, unchanged `add` record for a document.
    pub fn new(document_type: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            document_id: document_id.into(),
            action: DocumentAction::Add,
            fields: BTreeSet::new(),
            created_at: Utc::now(),
            revision: Uuid::new_v4(),
            has_changed: false,
        }
    }

    /// Rebuild a record loaded from storage. The record starts unchanged.
    pub fn from_parts(
        document_type: impl Into<String>,
        document_id: impl Into<String>,
        action: DocumentAction,
        fields: BTreeSet<String>,
        created_at: DateTime<Utc>,
        revision: Uuid,
    ) -> Self {
        let fields = match action {
            DocumentAction::Add => fields,
            DocumentAction::Delete => BTreeSet::new(),
        };
        Self {
            document_type: document_type.into(),
            document_id: document_id.into(),
            action,
            fields,
            created_at,
            revision,
            has_changed: false,
        }
    }

    /// Storage name of the record: `{document_type}-{document_id}`.
    pub fn storage_name(&self) -> String {
        format!("{}-{}", self.document_type, self.document_id)
    }

    /// Key of the currently persisted revision.
    pub fn key(&self) -> QueueKey {
        QueueKey {
            document_type: self.document_type.clone(),
            document_id: self.document_id.clone(),
            revision: self.revision,
        }
    }

    /// Mark a field as pending.
    ///
    /// # Returns
    ///
    /// * `true` - The field is pending (newly added or already present)
    /// * `false` - The document is marked for deletion; nothing changed
    pub fn add_field(&mut self, field_name: impl Into<String>) -> bool {
        if self.action == DocumentAction::Delete {
            return false;
        }

        if self.fields.insert(field_name.into()) {
            self.touch();
        }
        true
    }

    /// Mark the document for deletion, discarding any pending fields.
    pub fn set_for_deletion(&mut self) {
        if self.action != DocumentAction::Delete || !self.fields.is_empty() {
            self.action = DocumentAction::Delete;
            self.fields.clear();
            self.touch();
        }
    }

    /// Whether the record changed since it was created, loaded or last saved.
    pub fn has_changed(&self) -> bool {
        self.has_changed
    }

    /// Clear the change flag once the record has been persisted.
    pub fn mark_saved(&mut self) {
        self.has_changed = false;
    }

    fn touch(&mut self) {
        self.has_changed = true;
        self.revision = Uuid::new_v4();
    }
}
