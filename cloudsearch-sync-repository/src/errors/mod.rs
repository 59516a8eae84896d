//! Error types for the CloudSearch sync repository.
//!
//! Remote API failures are reported as [`CloudSearchError`]; persistence
//! failures as [`StoreError`].

mod cloudsearch_error;
mod store_error;

pub use cloudsearch_error::CloudSearchError;
pub use store_error::StoreError;
