//! # CloudSearch Sync Shared
//!
//! This crate defines the data structures shared across the CloudSearch sync system:
//! search documents and the size-bounded batches that carry them, the pending-change
//! ledger record, remote domain status, index field definitions, and the query and
//! response types used by the read path.

pub mod types;

pub use types::batch::{Batch, BatchError, BatchErrorRecord, BATCH_LIMIT, DOCUMENT_LIMIT};
pub use types::domain_status::{DomainStatus, ServiceEndpoint};
pub use types::index_field::{default_schema, IndexField, IndexFieldType};
pub use types::queued_update::{DocumentAction, QueueKey, QueuedUpdate};
pub use types::search_document::{SearchDocument, DEFAULT_LANG};
pub use types::search_query::{BooleanExpr, CloudSearchQuery, MatchValue, SortDirection};
pub use types::search_result::{FacetCounts, SearchHit, SearchResponse};
