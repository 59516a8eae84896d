//! Document and search service trait definition.

use async_trait::async_trait;

use cloudsearch_sync_shared::{Batch, CloudSearchQuery, SearchResponse};

use crate::errors::CloudSearchError;
use crate::types::BatchResponse;

/// Submits document batches to, and runs searches against, a domain.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Submit a batch to the document endpoint.
    ///
    /// # Arguments
    ///
    /// * `batch` - The packed batch; its JSON form is sent as-is
    ///
    /// # Returns
    ///
    /// * `Ok(BatchResponse)` - The decoded response, successful or not
    /// * `Err(CloudSearchError)` - If no decodable response was received
    async fn send_batch(&self, batch: &Batch) -> Result<BatchResponse, CloudSearchError>;

    /// Run a search against the search endpoint.
    ///
    /// # Arguments
    ///
    /// * `query` - The query parameters
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Hit ids and decoded facets
    /// * `Err(CloudSearchError)` - If the request failed
    async fn search(&self, query: &CloudSearchQuery) -> Result<SearchResponse, CloudSearchError>;
}
