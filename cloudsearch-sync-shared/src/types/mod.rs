//! This module defines the core data structures used across the CloudSearch sync system.

pub mod batch;
pub mod domain_status;
pub mod index_field;
pub mod queued_update;
pub mod search_document;
pub mod search_query;
pub mod search_result;
