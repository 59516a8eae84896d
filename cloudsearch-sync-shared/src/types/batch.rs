//! Size-bounded document batches.
//!
//! A [`Batch`] packs serialized [`SearchDocument`]s into a single JSON array whose
//! encoded size never exceeds [`BATCH_LIMIT`], while every individual document
//! stays below [`DOCUMENT_LIMIT`]. Rejected documents leave the batch untouched so
//! the caller can carry them over into a fresh batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::search_document::{SearchDocument, DEFAULT_LANG};

/// Maximum encoded size of a whole batch, in bytes.
pub const BATCH_LIMIT: usize = 5_242_880;

/// Maximum encoded size of a single document, in bytes.
pub const DOCUMENT_LIMIT: usize = 1_048_576;

/// Errors raised while packing documents into a batch.
///
/// Every variant maps to a stable numeric code (see [`BatchError::code`]) so callers
/// and logs can classify failures without matching on message text.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BatchError {
    /// The batch was built from a value that is neither a list nor empty.
    #[error("Invalid batch input: expected a list of documents, got {0}")]
    InvalidInput(String),

    /// A list of documents was expected.
    #[error("Expected a list of documents, got {0}")]
    ExpectedList(String),

    /// A document was not a JSON object.
    #[error("Document is not an object")]
    NotAnObject,

    /// A document could not be encoded.
    #[error("Failed to encode document: {0}")]
    Encoding(String),

    /// Adding the document at `index` failed; `source` holds the reason.
    #[error("Failed adding document at index {index}: {source}")]
    FailedAtIndex {
        index: usize,
        source: Box<BatchError>,
    },

    /// An empty list was handed to `add_documents`.
    #[error("Document list is empty")]
    EmptyList,

    /// A required attribute is missing.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A required attribute is present but empty.
    #[error("Required field is empty: {0}")]
    EmptyField(String),

    /// A required attribute is present but cannot be used.
    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// The encoded document alone exceeds [`DOCUMENT_LIMIT`].
    #[error("Document size {size} exceeds the limit of {limit} bytes")]
    DocumentTooLarge { size: usize, limit: usize },

    /// Adding the document would push the batch over [`BATCH_LIMIT`].
    #[error("Batch limit reached (documents: {count}, size: {size}, document size: {document_size})")]
    BatchLimitReached {
        count: usize,
        size: usize,
        document_size: usize,
    },
}

impl BatchError {
    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable numeric code for this error.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 100,
            Self::ExpectedList(_) => 110,
            Self::NotAnObject => 120,
            Self::Encoding(_) => 130,
            Self::FailedAtIndex { .. } => 210,
            Self::EmptyList => 220,
            Self::MissingField(_) => 300,
            Self::EmptyField(_) => 310,
            Self::InvalidField { .. } => 320,
            Self::DocumentTooLarge { .. } => 400,
            Self::BatchLimitReached { .. } => 500,
        }
    }

    /// Index of the document that failed, for errors raised by `add_documents`.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Self::FailedAtIndex { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The innermost error, looking through index annotations.
    pub fn root_cause(&self) -> &BatchError {
        match self {
            Self::FailedAtIndex { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the failure was caused by the batch being full.
    ///
    /// A full batch is not a problem with the document: the caller should send
    /// what it has and retry the document in a new batch.
    pub fn is_capacity(&self) -> bool {
        matches!(self.root_cause(), Self::BatchLimitReached { .. })
    }
}

/// A failure recorded in the batch's error accumulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchErrorRecord {
    pub code: u16,
    pub message: String,
}

impl From<&BatchError> for BatchErrorRecord {
    fn from(error: &BatchError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// An ordered, size-bounded collection of encoded documents.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    documents: Vec<SearchDocument>,
    encoded: Vec<String>,
    size: usize,
    errors: Vec<BatchErrorRecord>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batch from a JSON value.
    ///
    /// `null` yields an empty batch and a list is packed with
    /// [`Batch::add_values`]; any other value is rejected with code 100.
    ///
    /// # Arguments
    ///
    /// * `value` - `null` or a list of document objects
    ///
    /// # Returns
    ///
    /// * `Ok(Batch)` - The packed batch
    /// * `Err(BatchError)` - If the input is not usable or a document fails to pack
    pub fn from_value(value: &Value) -> Result<Self, BatchError> {
        let mut batch = Self::new();
        match value {
            Value::Null => Ok(batch),
            Value::Array(_) => {
                batch.add_values(value)?;
                Ok(batch)
            }
            other => Err(BatchError::InvalidInput(json_kind(other).to_string())),
        }
    }

    /// Validate, normalize and append a document.
    ///
    /// The document must carry a non-empty `type` and `id` and a non-zero `version`;
    /// an empty `lang` is defaulted to `en`. Field names are lowercased and `null`
    /// field values become empty strings. On failure the batch's documents are left
    /// unchanged and the failure is added to the error accumulator.
    ///
    /// # Arguments
    ///
    /// * `document` - The document to add; it is copied, so a rejected document
    ///   stays available to the caller for the next batch
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was appended
    /// * `Err(BatchError)` - Validation, document size, or batch capacity failure
    pub fn add_document(&mut self, document: &SearchDocument) -> Result<(), BatchError> {
        let result = self.try_add(document);
        if let Err(ref e) = result {
            self.errors.push(BatchErrorRecord::from(e));
        }
        result
    }

    /// Add every document in order, stopping at the first failure.
    ///
    /// Documents before the failing one remain in the batch. The returned error
    /// carries the failing index so the caller can resume from there.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of documents added
    /// * `Err(BatchError)` - `EmptyList` or `FailedAtIndex`
    pub fn add_documents(&mut self, documents: &[SearchDocument]) -> Result<usize, BatchError> {
        if documents.is_empty() {
            let error = BatchError::EmptyList;
            self.errors.push(BatchErrorRecord::from(&error));
            return Err(error);
        }

        for (index, document) in documents.iter().enumerate() {
            if let Err(e) = self.add_document(document) {
                let error = BatchError::FailedAtIndex {
                    index,
                    source: Box::new(e),
                };
                self.errors.push(BatchErrorRecord::from(&error));
                return Err(error);
            }
        }

        Ok(documents.len())
    }

    /// Add a document given as a JSON object.
    ///
    /// Missing required attributes fail with code 300, empty ones with code 310 and
    /// unusable ones (such as a non-numeric `version`) with code 320.
    pub fn add_value(&mut self, value: &Value) -> Result<(), BatchError> {
        match document_from_value(value) {
            Ok(document) => self.add_document(&document),
            Err(e) => {
                self.errors.push(BatchErrorRecord::from(&e));
                Err(e)
            }
        }
    }

    /// Add a JSON list of document objects, stopping at the first failure.
    pub fn add_values(&mut self, value: &Value) -> Result<usize, BatchError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                let error = BatchError::ExpectedList(json_kind(other).to_string());
                self.errors.push(BatchErrorRecord::from(&error));
                return Err(error);
            }
        };

        if items.is_empty() {
            let error = BatchError::EmptyList;
            self.errors.push(BatchErrorRecord::from(&error));
            return Err(error);
        }

        for (index, item) in items.iter().enumerate() {
            if let Err(e) = self.add_value(item) {
                let error = BatchError::FailedAtIndex {
                    index,
                    source: Box::new(e),
                };
                self.errors.push(BatchErrorRecord::from(&error));
                return Err(error);
            }
        }

        Ok(items.len())
    }

    /// Documents in insertion order, as normalized when added.
    pub fn documents(&self) -> &[SearchDocument] {
        &self.documents
    }

    /// Number of documents in the batch.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the batch holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Exact byte length of [`Batch::to_json`].
    pub fn size(&self) -> usize {
        if self.encoded.is_empty() {
            2
        } else {
            self.size
        }
    }

    /// Every failure seen by this batch, oldest first.
    pub fn errors(&self) -> &[BatchErrorRecord] {
        &self.errors
    }

    /// The batch as a JSON array, byte-for-byte what is submitted.
    pub fn to_json(&self) -> String {
        let mut out = String::with_capacity(self.size());
        out.push('[');
        out.push_str(&self.encoded.join(","));
        out.push(']');
        out
    }

    fn try_add(&mut self, document: &SearchDocument) -> Result<(), BatchError> {
        let mut document = document.clone();

        if document.doc_type.trim().is_empty() {
            return Err(BatchError::EmptyField("type".to_string()));
        }
        if document.id.trim().is_empty() {
            return Err(BatchError::EmptyField("id".to_string()));
        }
        if document.version == 0 {
            return Err(BatchError::EmptyField("version".to_string()));
        }
        if document.lang.trim().is_empty() {
            document.lang = DEFAULT_LANG.to_string();
        }
        document.sanitize_fields();

        let encoded =
            serde_json::to_string(&document).map_err(|e| BatchError::Encoding(e.to_string()))?;

        if encoded.len() > DOCUMENT_LIMIT {
            return Err(BatchError::DocumentTooLarge {
                size: encoded.len(),
                limit: DOCUMENT_LIMIT,
            });
        }

        // Opening and closing brackets, plus one separator per extra document.
        let projected = if self.encoded.is_empty() {
            2 + encoded.len()
        } else {
            self.size + 1 + encoded.len()
        };
        if projected > BATCH_LIMIT {
            return Err(BatchError::BatchLimitReached {
                count: self.documents.len(),
                size: self.size(),
                document_size: encoded.len(),
            });
        }

        self.size = projected;
        self.encoded.push(encoded);
        self.documents.push(document);
        Ok(())
    }
}

fn document_from_value(value: &Value) -> Result<SearchDocument, BatchError> {
    let object = value.as_object().ok_or(BatchError::NotAnObject)?;

    let doc_type = required_string(object, "type")?;
    let id = required_string(object, "id")?;
    let version = required_version(object)?;

    let lang = match object.get("lang") {
        Some(Value::String(lang)) => lang.clone(),
        Some(Value::Null) | None => String::new(),
        Some(_) => return Err(BatchError::invalid_field("lang", "expected a string")),
    };

    let fields = match object.get("fields") {
        Some(Value::Object(fields)) => fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
        Some(Value::Null) | None => BTreeMap::new(),
        Some(_) => return Err(BatchError::invalid_field("fields", "expected an object")),
    };

    Ok(SearchDocument {
        doc_type,
        id,
        version,
        lang,
        fields,
    })
}

fn required_string(object: &Map<String, Value>, name: &str) -> Result<String, BatchError> {
    match object.get(name) {
        None => Err(BatchError::MissingField(name.to_string())),
        Some(Value::Null) => Err(BatchError::EmptyField(name.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(BatchError::EmptyField(name.to_string()))
        }
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(BatchError::invalid_field(name, "expected a string")),
    }
}

fn required_version(object: &Map<String, Value>) -> Result<u64, BatchError> {
    match object.get("version") {
        None => Err(BatchError::MissingField("version".to_string())),
        Some(Value::Null) => Err(BatchError::EmptyField("version".to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(BatchError::EmptyField("version".to_string()))
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| BatchError::invalid_field("version", "expected an unsigned integer")),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| BatchError::invalid_field("version", "expected an unsigned integer")),
        Some(_) => Err(BatchError::invalid_field(
            "version",
            "expected an unsigned integer",
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
