//! Dependency initialization and wiring for the sync service.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use cloudsearch_sync_repository::config::{
    DEFAULT_API_VERSION, DEFAULT_CONFIG_ENDPOINT, DEFAULT_EGRESS_IP_LOOKUP_URL, DEFAULT_REGION,
    DEFAULT_SEARCH_API_VERSION,
};
use cloudsearch_sync_repository::{
    run_migrations, settings_keys, ClientConfig, CloudSearchConfigClient,
    CloudSearchDocumentClient, ConfigApi, Credentials, DocumentService, SettingsStore,
};
use cloudsearch_sync_shared::default_schema;

use super::Stores;
use crate::domain::{DomainManager, DomainPollConfig};
use crate::errors::SyncError;
use crate::extensions::Extensions;
use crate::query::SearchService;
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::sweep::{QueueAllSweep, SweepConfig};
use crate::sync::{BatchSync, SyncConfig};
use crate::ServiceError;

/// Default document types indexed and swept.
const DEFAULT_DOCUMENT_TYPES: &str = "post,page";

/// Default seconds between queue-all pages.
const DEFAULT_QUEUE_ALL_INTERVAL_SECS: u64 = 60;

/// Default maximum database connections.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// What to do before the scheduler starts.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Domain named by `CLOUDSEARCH_DOMAIN`, if any.
    pub domain: Option<String>,
    /// Create the domain when missing, then bring its schema up to date.
    pub ensure_domain: bool,
    /// Start a queue-all sweep.
    pub queue_all: bool,
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub stores: Stores,
    pub domain: DomainManager,
    pub sync: Arc<BatchSync>,
    pub sweep: Arc<QueueAllSweep>,
    pub search: SearchService,
    /// The configured scheduler ready to run.
    pub scheduler: Scheduler,
    pub startup: StartupOptions,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string; without it every store is in-memory
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: Credentials, stored as settings;
    ///   when unset the stored settings are used
    /// - `CLOUDSEARCH_DOMAIN`: Domain name, stored as the `search-domain` setting
    /// - `CLOUDSEARCH_REGION`: Signing region (default: us-east-1)
    /// - `CLOUDSEARCH_CONFIG_ENDPOINT`: Configuration API URL
    /// - `CLOUDSEARCH_API_VERSION`: Configuration and document API version (default: 2011-02-01)
    /// - `CLOUDSEARCH_SEARCH_API_VERSION`: Search API version (default: 2013-01-01)
    /// - `EGRESS_IP_LOOKUP_URL`: Service answering with the caller's public IP
    /// - `BATCH_INTERVAL_SECS`: Stored as the `batch-interval` setting
    /// - `QUEUE_ALL_INTERVAL_SECS`: Seconds between queue-all pages (default: 60)
    /// - `INDEXED_DOCUMENT_TYPES`: Comma-separated document types (default: post,page)
    /// - `INDEXED_FIELDS`: Comma-separated fields sent for full documents
    ///   (default: every schema field)
    /// - `ENSURE_DOMAIN`: Create and configure the domain at startup (default: false)
    /// - `QUEUE_ALL_ON_START`: Start a queue-all sweep at startup (default: false)
    /// - `RUN_SYNC_ON_START`: Run a sync cycle right away (default: false)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServiceError)` - If the database or the API clients cannot be set up
    pub async fn new() -> Result<Self, ServiceError> {
        Self::with_extensions(Extensions::new()).await
    }

    /// Like [`Dependencies::new`], with contributors registered up front.
    pub async fn with_extensions(extensions: Extensions) -> Result<Self, ServiceError> {
        let stores = Self::connect_stores().await?;

        let domain_name = env::var("CLOUDSEARCH_DOMAIN").ok().filter(|d| !d.is_empty());
        if let Some(name) = &domain_name {
            stores
                .settings
                .set(settings_keys::SEARCH_DOMAIN, name)
                .await
                .map_err(SyncError::from)?;
        }

        if let Some(seconds) = env_parse::<i64>("BATCH_INTERVAL_SECS") {
            stores
                .settings
                .set(settings_keys::BATCH_INTERVAL, &seconds.to_string())
                .await
                .map_err(SyncError::from)?;
        }

        let client_config = ClientConfig {
            config_endpoint: env_or("CLOUDSEARCH_CONFIG_ENDPOINT", DEFAULT_CONFIG_ENDPOINT),
            api_version: env_or("CLOUDSEARCH_API_VERSION", DEFAULT_API_VERSION),
            search_api_version: env_or("CLOUDSEARCH_SEARCH_API_VERSION", DEFAULT_SEARCH_API_VERSION),
            region: env_or("CLOUDSEARCH_REGION", DEFAULT_REGION),
            egress_ip_lookup_url: env_or("EGRESS_IP_LOOKUP_URL", DEFAULT_EGRESS_IP_LOOKUP_URL),
            ..ClientConfig::default()
        };

        let document_types = env_list("INDEXED_DOCUMENT_TYPES")
            .unwrap_or_else(|| split_list(DEFAULT_DOCUMENT_TYPES));
        let fields = env_list("INDEXED_FIELDS").unwrap_or_else(|| {
            extensions
                .schema(default_schema())
                .into_iter()
                .map(|field| field.name)
                .collect()
        });

        let startup = StartupOptions {
            domain: domain_name,
            ensure_domain: env_flag("ENSURE_DOMAIN"),
            queue_all: env_flag("QUEUE_ALL_ON_START"),
        };

        info!(
            region = %client_config.region,
            config_endpoint = %client_config.config_endpoint,
            domain = ?startup.domain,
            document_types = ?document_types,
            fields = fields.len(),
            "Initializing dependencies"
        );

        let credentials = Self::resolve_credentials(stores.settings.as_ref()).await?;

        let config_api: Arc<dyn ConfigApi> = Arc::new(
            CloudSearchConfigClient::new(credentials.clone(), client_config.clone())
                .map_err(|e| ServiceError::config(format!("Failed to create config client: {}", e)))?,
        );
        let documents: Arc<dyn DocumentService> = Arc::new(
            CloudSearchDocumentClient::new(credentials, client_config, stores.settings.clone())
                .map_err(|e| {
                    ServiceError::config(format!("Failed to create document client: {}", e))
                })?,
        );

        info!("CloudSearch clients created");

        let sweep = Arc::new(QueueAllSweep::new(
            stores.clone(),
            SweepConfig {
                document_types,
                fields: fields.clone(),
                ..SweepConfig::default()
            },
        ));

        let sync = Arc::new(BatchSync::new(
            config_api.clone(),
            documents.clone(),
            stores.clone(),
            extensions.clone(),
            SyncConfig {
                fields,
                ..SyncConfig::default()
            },
        ));

        let domain = DomainManager::new(
            config_api,
            stores.settings.clone(),
            extensions,
            sweep.clone(),
            DomainPollConfig::default(),
        );

        let search = SearchService::new(documents);

        let scheduler = Scheduler::new(
            sync.clone(),
            sweep.clone(),
            SchedulerConfig {
                sweep_interval: Duration::from_secs(
                    env_parse::<u64>("QUEUE_ALL_INTERVAL_SECS")
                        .filter(|secs| *secs > 0)
                        .unwrap_or(DEFAULT_QUEUE_ALL_INTERVAL_SECS),
                ),
                run_immediately: env_flag("RUN_SYNC_ON_START"),
                ..SchedulerConfig::default()
            },
        );

        Ok(Self {
            stores,
            domain,
            sync,
            sweep,
            search,
            scheduler,
            startup,
        })
    }

    /// Run the startup work named by [`StartupOptions`].
    pub async fn prepare(&self) -> Result<(), ServiceError> {
        if self.startup.ensure_domain {
            let name = self.startup.domain.as_deref().ok_or_else(|| {
                ServiceError::config("ENSURE_DOMAIN is set but CLOUDSEARCH_DOMAIN is not")
            })?;

            if !self.domain.credentials_are_valid().await? {
                return Err(ServiceError::config("CloudSearch rejected the credentials"));
            }

            if self.domain.domain_exists(name).await? {
                let changed = self.domain.apply_schema(name).await?;
                info!(domain = %name, changed = changed.len(), "Domain schema checked");
            } else {
                self.domain.initialize_new_domain(name).await?;
            }

            if !self.domain.refresh_endpoints(name).await? {
                warn!(domain = %name, "Domain has no endpoints yet");
            }
        }

        if self.startup.queue_all {
            self.sweep.start().await?;
        }

        Ok(())
    }

    async fn connect_stores() -> Result<Stores, ServiceError> {
        let Ok(database_url) = env::var("DATABASE_URL") else {
            warn!("DATABASE_URL not set, using in-memory stores");
            return Ok(Stores::in_memory());
        };

        let max_connections = env_parse::<u32>("DATABASE_MAX_CONNECTIONS")
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&database_url)
            .await
            .map_err(|e| ServiceError::config(format!("Failed to connect to database: {}", e)))?;

        run_migrations(&pool)
            .await
            .map_err(|e| ServiceError::config(format!("Failed to run migrations: {}", e)))?;

        info!(max_connections = max_connections, "Database connection established");
        Ok(Stores::postgres(pool))
    }

    /// Credentials from the environment, stored for later runs, or from the settings store.
    async fn resolve_credentials(settings: &dyn SettingsStore) -> Result<Credentials, ServiceError> {
        if let (Ok(key_id), Ok(secret)) = (
            env::var("AWS_ACCESS_KEY_ID"),
            env::var("AWS_SECRET_ACCESS_KEY"),
        ) {
            settings
                .set(settings_keys::ACCESS_KEY_ID, &key_id)
                .await
                .map_err(SyncError::from)?;
            settings
                .set(settings_keys::SECRET_ACCESS_KEY, &secret)
                .await
                .map_err(SyncError::from)?;
            return Ok(Credentials::new(key_id, secret));
        }

        let key_id = settings
            .get(settings_keys::ACCESS_KEY_ID)
            .await
            .map_err(SyncError::from)?;
        let secret = settings
            .get(settings_keys::SECRET_ACCESS_KEY)
            .await
            .map_err(SyncError::from)?;

        match (key_id, secret) {
            (Some(key_id), Some(secret)) => Ok(Credentials::new(key_id, secret)),
            _ => Err(ServiceError::config(
                "No credentials: set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY",
            )),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name)
            .unwrap_or_default()
            .trim()
            .to_lowercase()
            .as_str(),
        "1" | "true" | "yes"
    )
}

fn env_list(name: &str) -> Option<Vec<String>> {
    env::var(name)
        .ok()
        .map(|value| split_list(&value))
        .filter(|list| !list.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
