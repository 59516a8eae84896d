//! Configuration API trait definition.
//!
//! This module defines the typed operations of the search service's
//! configuration API, allowing the domain manager and the sync engine to be
//! tested against mock implementations.

use async_trait::async_trait;
use tracing::{info, warn};

use cloudsearch_sync_shared::{DomainStatus, IndexField};

use crate::errors::CloudSearchError;
use crate::types::{AccessPoliciesStatus, AccessPolicy, IndexFieldStatus, RemoteError};

/// Network used when the caller's egress IP cannot be discovered.
pub const OPEN_NETWORK: &str = "0.0.0.0/0";

/// Typed operations of the configuration API.
///
/// Every failing call records the remote `Error` object, when there is one, so it
/// can be read back with [`ConfigApi::last_error`].
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Describe domains. An empty list describes every domain of the account.
    ///
    /// # Arguments
    ///
    /// * `names` - Domain names to describe
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<DomainStatus>)` - One status per existing domain
    /// * `Err(CloudSearchError)` - If the call failed
    async fn describe_domains(&self, names: &[String])
        -> Result<Vec<DomainStatus>, CloudSearchError>;

    /// Create a domain and return its initial status.
    async fn create_domain(&self, name: &str) -> Result<DomainStatus, CloudSearchError>;

    /// List the index fields currently defined on a domain.
    async fn describe_index_fields(
        &self,
        domain: &str,
    ) -> Result<Vec<IndexFieldStatus>, CloudSearchError>;

    /// Define (or redefine) an index field.
    async fn define_index_field(
        &self,
        domain: &str,
        field: &IndexField,
    ) -> Result<(), CloudSearchError>;

    /// Define a named rank expression.
    async fn define_rank_expression(
        &self,
        domain: &str,
        name: &str,
        expression: &str,
    ) -> Result<(), CloudSearchError>;

    /// Delete a named rank expression.
    async fn delete_rank_expression(&self, domain: &str, name: &str)
        -> Result<(), CloudSearchError>;

    /// Read the domain's access policies.
    async fn describe_service_access_policies(
        &self,
        domain: &str,
    ) -> Result<AccessPoliciesStatus, CloudSearchError>;

    /// Replace the domain's access policies.
    ///
    /// Fails with [`CloudSearchError::MalformedRequest`] when the service echoes back
    /// empty options or does not start processing the change.
    async fn update_service_access_policies(
        &self,
        domain: &str,
        policy: &AccessPolicy,
    ) -> Result<(), CloudSearchError>;

    /// Ask the domain to re-index its documents.
    async fn index_documents(&self, domain: &str) -> Result<(), CloudSearchError>;

    /// The caller's public IP as seen by an external lookup service.
    async fn egress_ip(&self) -> Option<String>;

    /// The most recently recorded remote error.
    fn last_error(&self) -> Option<RemoteError>;

    /// Describe a single domain.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(DomainStatus))` - The domain exists
    /// * `Ok(None)` - The domain does not exist
    async fn describe_domain(&self, name: &str) -> Result<Option<DomainStatus>, CloudSearchError> {
        let mut domains = self.describe_domains(&[name.to_string()]).await?;
        Ok(if domains.is_empty() {
            None
        } else {
            Some(domains.swap_remove(0))
        })
    }

    /// Whether the credentials are accepted.
    async fn test_connection(&self) -> Result<bool, CloudSearchError> {
        match self.describe_domains(&[]).await {
            Ok(_) => Ok(true),
            Err(CloudSearchError::NotAuthenticated(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Define every field of `schema` in order, stopping at the first failure.
    ///
    /// Fields defined before a failure stay defined.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<DomainStatus>)` - The domain's status after the schema was applied
    /// * `Err(CloudSearchError)` - The first field definition failure
    async fn load_schema(
        &self,
        domain: &str,
        schema: &[IndexField],
    ) -> Result<Vec<DomainStatus>, CloudSearchError> {
        for field in schema {
            self.define_index_field(domain, field).await?;
        }
        self.describe_domains(&[domain.to_string()]).await
    }

    /// Build an allow-all policy for the domain's existing services.
    ///
    /// Access is limited to the caller's egress IP (`ip/32`) when it can be
    /// discovered and falls back to `0.0.0.0/0` otherwise.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(AccessPolicy))` - A policy covering the existing services
    /// * `Ok(None)` - The domain does not exist or has no services yet
    async fn default_service_access_policy(
        &self,
        domain: &str,
    ) -> Result<Option<AccessPolicy>, CloudSearchError> {
        let Some(status) = self.describe_domain(domain).await? else {
            return Ok(None);
        };

        let arns = status.service_arns();
        if arns.is_empty() {
            return Ok(None);
        }

        let network = match self.egress_ip().await {
            Some(ip) => format!("{}/32", ip),
            None => {
                warn!(domain = %domain, "Egress IP unknown, allowing access from any address");
                OPEN_NETWORK.to_string()
            }
        };

        info!(domain = %domain, network = %network, services = arns.len(), "Built default access policy");
        Ok(Some(AccessPolicy::allow_from(&arns, &network)))
    }
}
