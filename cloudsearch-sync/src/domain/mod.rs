//! Domain management.
//!
//! Creates and configures the remote domain: index schema, access policy,
//! re-indexing and the service endpoints kept in the settings store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use cloudsearch_sync_repository::{settings_keys, ConfigApi, SettingsStore};
use cloudsearch_sync_shared::{default_schema, DomainStatus, IndexField, IndexFieldType};

use crate::errors::SyncError;
use crate::extensions::Extensions;
use crate::sweep::QueueAllSweep;

/// How long to wait for a new domain to report `created`.
#[derive(Debug, Clone)]
pub struct DomainPollConfig {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for DomainPollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            attempts: 60,
        }
    }
}

/// Creates, configures and inspects the remote domain.
pub struct DomainManager {
    config_api: Arc<dyn ConfigApi>,
    settings: Arc<dyn SettingsStore>,
    extensions: Extensions,
    sweep: Arc<QueueAllSweep>,
    poll: DomainPollConfig,
}

impl DomainManager {
    pub fn new(
        config_api: Arc<dyn ConfigApi>,
        settings: Arc<dyn SettingsStore>,
        extensions: Extensions,
        sweep: Arc<QueueAllSweep>,
        poll: DomainPollConfig,
    ) -> Self {
        Self {
            config_api,
            settings,
            extensions,
            sweep,
            poll,
        }
    }

    /// Whether the configured credentials are accepted.
    pub async fn credentials_are_valid(&self) -> Result<bool, SyncError> {
        Ok(self.config_api.test_connection().await?)
    }

    pub async fn domain_exists(&self, name: &str) -> Result<bool, SyncError> {
        Ok(self.config_api.describe_domain(name).await?.is_some())
    }

    /// Whether the domain is waiting for an `IndexDocuments` call.
    pub async fn needs_indexing(&self, name: &str) -> Result<bool, SyncError> {
        Ok(self
            .config_api
            .describe_domain(name)
            .await?
            .map(|status| status.requires_index_documents)
            .unwrap_or(false))
    }

    pub async fn index_documents(&self, name: &str) -> Result<(), SyncError> {
        self.config_api.index_documents(name).await?;
        info!(domain = %name, tags = "schema,notice", "Re-indexing requested");
        Ok(())
    }

    /// Document service endpoint of a domain, if it has one yet.
    pub async fn document_endpoint(&self, name: &str) -> Result<Option<String>, SyncError> {
        Ok(self
            .config_api
            .describe_domain(name)
            .await?
            .and_then(|status| status.document_endpoint().map(str::to_string)))
    }

    /// Search service endpoint of a domain, if it has one yet.
    pub async fn search_endpoint(&self, name: &str) -> Result<Option<String>, SyncError> {
        Ok(self
            .config_api
            .describe_domain(name)
            .await?
            .and_then(|status| status.search_endpoint().map(str::to_string)))
    }

    /// Store the domain's current endpoints in the settings store.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Both endpoints were known and stored
    /// * `Ok(false)` - The domain has no endpoints yet; nothing was written
    pub async fn refresh_endpoints(&self, name: &str) -> Result<bool, SyncError> {
        let status = self
            .config_api
            .describe_domain(name)
            .await?
            .ok_or_else(|| SyncError::config(format!("domain {} does not exist", name)))?;

        let (Some(document), Some(search)) = (status.document_endpoint(), status.search_endpoint())
        else {
            return Ok(false);
        };

        self.settings
            .set(settings_keys::DOCUMENT_ENDPOINT, document)
            .await?;
        self.settings
            .set(settings_keys::SEARCH_ENDPOINT, search)
            .await?;
        info!(domain = %name, document = %document, search = %search, "Endpoints refreshed");
        Ok(true)
    }

    /// Create a domain and give it the schema and the default access policy.
    ///
    /// Fails when the domain already exists.
    #[instrument(skip(self))]
    pub async fn initialize_new_domain(&self, name: &str) -> Result<DomainStatus, SyncError> {
        if self.domain_exists(name).await? {
            return Err(SyncError::config(format!("domain {} already exists", name)));
        }

        self.config_api.create_domain(name).await?;
        let status = self.wait_until_created(name).await?;

        self.settings
            .set(settings_keys::SEARCH_DOMAIN, name)
            .await?;
        self.apply_schema(name).await?;
        self.apply_access_policy(name).await?;

        info!(domain = %name, tags = "domain,success", "Domain initialized");
        Ok(status)
    }

    async fn wait_until_created(&self, name: &str) -> Result<DomainStatus, SyncError> {
        for attempt in 1..=self.poll.attempts {
            if let Some(status) = self.config_api.describe_domain(name).await? {
                if status.created {
                    return Ok(status);
                }
            }
            info!(domain = %name, attempt = attempt, "Waiting for domain creation");
            tokio::time::sleep(self.poll.interval).await;
        }
        Err(SyncError::config(format!(
            "domain {} was not created after {} checks",
            name, self.poll.attempts
        )))
    }

    /// Apply the default access policy for the domain's services.
    ///
    /// # Returns
    ///
    /// * `Ok(false)` - The domain has no services yet; nothing was applied
    pub async fn apply_access_policy(&self, name: &str) -> Result<bool, SyncError> {
        let Some(policy) = self.config_api.default_service_access_policy(name).await? else {
            info!(domain = %name, tags = "access policy,notice", "No services yet, policy not applied");
            return Ok(false);
        };

        self.config_api
            .update_service_access_policies(name, &policy)
            .await?;
        info!(domain = %name, tags = "access policy,success", "Access policy applied");
        Ok(true)
    }

    /// The default schema with every schema contributor applied.
    pub fn schema(&self) -> Vec<IndexField> {
        self.extensions.schema(default_schema())
    }

    /// Define the fields that are missing from the domain or have a different type.
    ///
    /// Failed definitions are logged and skipped. When anything changed, the
    /// domain is re-indexed if it asks for it and a queue-all sweep starts.
    ///
    /// # Returns
    ///
    /// The names of the fields that were defined.
    #[instrument(skip(self))]
    pub async fn apply_schema(&self, name: &str) -> Result<Vec<String>, SyncError> {
        let existing: HashMap<String, Option<IndexFieldType>> = self
            .config_api
            .describe_index_fields(name)
            .await?
            .into_iter()
            .map(|field| (field.name, field.field_type))
            .collect();

        let mut changed = Vec::new();
        for field in self.schema() {
            if existing.get(&field.name) == Some(&Some(field.field_type)) {
                continue;
            }
            match self.config_api.define_index_field(name, &field).await {
                Ok(()) => {
                    info!(domain = %name, field = %field.name, tags = "schema,success", "Index field defined");
                    changed.push(field.name);
                }
                Err(e) => {
                    warn!(
                        domain = %name,
                        field = %field.name,
                        error = %e,
                        tags = "schema,error",
                        "Index field definition failed"
                    );
                }
            }
        }

        if !changed.is_empty() {
            if self.needs_indexing(name).await? {
                self.index_documents(name).await?;
            }
            self.sweep.start().await?;
        }

        Ok(changed)
    }
}
