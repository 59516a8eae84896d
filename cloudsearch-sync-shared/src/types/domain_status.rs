//! Remote domain status.
//!
//! Mirrors the `DomainStatus` structure returned by `DescribeDomains` and
//! `CreateDomain`. Values are fetched on demand and never cached.

use serde::{Deserialize, Serialize};

/// ARN and endpoint of one of a domain's services.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceEndpoint {
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// State of a remote search domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DomainStatus {
    pub domain_name: String,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub processing: bool,
    #[serde(default)]
    pub requires_index_documents: bool,
    #[serde(default)]
    pub search_instance_count: u32,
    #[serde(default)]
    pub num_searchable_docs: Option<u64>,
    #[serde(default)]
    pub doc_service: Option<ServiceEndpoint>,
    #[serde(default)]
    pub search_service: Option<ServiceEndpoint>,
}

impl DomainStatus {
    /// Whether the domain can accept a document batch right now.
    ///
    /// A ready domain is not deleted, not processing, does not need its
    /// documents re-indexed, and has at least one search instance.
    pub fn is_ready(&self) -> bool {
        !self.deleted
            && !self.processing
            && !self.requires_index_documents
            && self.search_instance_count > 0
    }

    /// Endpoint of the document service, if provisioned.
    pub fn document_endpoint(&self) -> Option<&str> {
        self.doc_service.as_ref()?.endpoint.as_deref()
    }

    /// Endpoint of the search service, if provisioned.
    pub fn search_endpoint(&self) -> Option<&str> {
        self.search_service.as_ref()?.endpoint.as_deref()
    }

    /// ARNs of the services that exist, search service first.
    pub fn service_arns(&self) -> Vec<&str> {
        [&self.search_service, &self.doc_service]
            .into_iter()
            .filter_map(|service| service.as_ref()?.arn.as_deref())
            .collect()
    }
}
