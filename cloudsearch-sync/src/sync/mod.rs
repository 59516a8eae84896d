//! Batch sync engine.
//!
//! One call to [`BatchSync::run_cycle`] moves the oldest queued changes into a
//! single batch and sends it:
//!
//! 1. **Guard**: skip the cycle unless the remote domain is ready
//! 2. **Lease**: take the batch lease or give way to the current owner
//! 3. **Fetch**: read the oldest queue entries
//! 4. **Build**: re-read each document from the content store and pack it
//! 5. **Send**: submit the batch and drop the sent entries from the queue
//!
//! The lease is released on every path once it is held.

pub mod lease;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use cloudsearch_sync_repository::{settings_keys, ConfigApi, DocumentService, SettingsStore};
use cloudsearch_sync_shared::{Batch, DocumentAction, QueueKey, QueuedUpdate, SearchDocument};

use crate::config::Stores;
use crate::errors::SyncError;
use crate::extensions::Extensions;

/// Lease key shared by every batch worker.
pub const BATCH_LEASE_KEY: &str = "cloudsearch-batch-lock";

/// Interval used when no positive batch interval is configured.
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_secs(86_400);

/// Batch type of an `add` document.
const ADD_TYPE: &str = "add";

/// Batch type of a `delete` document.
const DELETE_TYPE: &str = "delete";

/// Configuration for the batch sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of queue entries read per cycle.
    pub batch_size: usize,
    /// Fields read for an `add` entry that names none.
    pub fields: Vec<String>,
    pub lease_key: String,
    pub lease_ttl: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            fields: Vec::new(),
            lease_key: BATCH_LEASE_KEY.to_string(),
            lease_ttl: Duration::from_secs(300),
        }
    }
}

/// How a sync cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The domain is missing, not configured or not ready.
    NotReady,
    /// Another worker holds the batch lease.
    Locked,
    /// Nothing could be packed into a batch.
    Empty,
    /// The batch was accepted and its entries removed from the queue.
    Sent { documents: usize, deleted: usize },
    /// The batch was rejected or not delivered; its entries stay queued.
    SendFailed { documents: usize, error: String },
    /// The cycle stopped on an unexpected error.
    Failed(String),
}

/// Snapshot of the sync state.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub queued: u64,
    pub last_cron_time: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub interval: Duration,
}

/// Read the `batch-interval` setting.
///
/// Missing, unparsable and non-positive values fall back to
/// [`DEFAULT_BATCH_INTERVAL`].
pub async fn batch_interval(settings: &dyn SettingsStore) -> Result<Duration, SyncError> {
    let seconds = settings
        .get(settings_keys::BATCH_INTERVAL)
        .await?
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|seconds| *seconds > 0);

    Ok(match seconds {
        Some(seconds) => Duration::from_secs(seconds as u64),
        None => DEFAULT_BATCH_INTERVAL,
    })
}

/// Ships queued document changes to the remote domain.
pub struct BatchSync {
    config_api: Arc<dyn ConfigApi>,
    documents: Arc<dyn DocumentService>,
    stores: Stores,
    extensions: Extensions,
    config: SyncConfig,
}

impl BatchSync {
    pub fn new(
        config_api: Arc<dyn ConfigApi>,
        documents: Arc<dyn DocumentService>,
        stores: Stores,
        extensions: Extensions,
        config: SyncConfig,
    ) -> Self {
        Self {
            config_api,
            documents,
            stores,
            extensions,
            config,
        }
    }

    /// Run one sync cycle.
    ///
    /// Never fails: every error is logged and reported as a [`CycleOutcome`],
    /// and queue entries that were not sent stay queued for the next cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> CycleOutcome {
        match self.try_cycle().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, tags = "send-queue,error", "Sync cycle failed");
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_cycle(&self) -> Result<CycleOutcome, SyncError> {
        let Some(domain) = self.stores.settings.get(settings_keys::SEARCH_DOMAIN).await? else {
            warn!(tags = "send-queue,notice", "No search domain configured, skipping cycle");
            return Ok(CycleOutcome::NotReady);
        };

        match self.config_api.describe_domain(&domain).await? {
            Some(status) if status.is_ready() => {}
            Some(status) => {
                warn!(
                    domain = %domain,
                    processing = status.processing,
                    requires_index_documents = status.requires_index_documents,
                    search_instance_count = status.search_instance_count,
                    tags = "send-queue,notice",
                    "Domain not ready, skipping cycle"
                );
                return Ok(CycleOutcome::NotReady);
            }
            None => {
                warn!(domain = %domain, tags = "send-queue,notice", "Domain not found, skipping cycle");
                return Ok(CycleOutcome::NotReady);
            }
        }

        let leases = self.stores.leases.as_ref();
        let Some(token) =
            lease::acquire(leases, &self.config.lease_key, self.config.lease_ttl).await?
        else {
            info!(lease = %self.config.lease_key, tags = "send-queue,notice", "Batch already running elsewhere");
            return Ok(CycleOutcome::Locked);
        };

        let result = self.locked_cycle().await;

        match leases.release(&self.config.lease_key, &token).await {
            Ok(true) => {}
            Ok(false) => warn!(lease = %self.config.lease_key, "Batch lease expired before release"),
            Err(e) => error!(lease = %self.config.lease_key, error = %e, "Failed to release batch lease"),
        }

        result
    }

    async fn locked_cycle(&self) -> Result<CycleOutcome, SyncError> {
        let now = Utc::now();
        self.stores
            .settings
            .set(settings_keys::LAST_CRON_TIME, &now.timestamp().to_string())
            .await?;

        let entries = self.stores.queue.oldest(self.config.batch_size).await?;
        if entries.is_empty() {
            debug!("Queue is empty");
            return Ok(CycleOutcome::Empty);
        }

        let version = now.timestamp().max(1) as u64;
        let (batch, included, rejected) = self.build_batch(&entries, version).await?;

        if !rejected.is_empty() {
            let dropped = self.stores.queue.delete(&rejected).await?;
            warn!(
                rejected = rejected.len(),
                dropped = dropped,
                tags = "send-queue,error",
                "Dropped entries that can never be sent"
            );
        }

        if batch.is_empty() {
            info!(
                queued = entries.len(),
                tags = "send-queue,notice",
                "No queued document could be packed"
            );
            return Ok(CycleOutcome::Empty);
        }

        let documents = included.len();
        match self.documents.send_batch(&batch).await {
            Ok(response) if response.is_success() => {
                let deleted = self.stores.queue.delete(&included).await?;
                info!(
                    documents = documents,
                    deleted = deleted,
                    adds = response.adds,
                    deletes = response.deletes,
                    tags = "send-queue,success",
                    "Batch sent"
                );
                Ok(CycleOutcome::Sent { documents, deleted })
            }
            Ok(response) => {
                let errors: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
                error!(
                    documents = documents,
                    status = %response.status,
                    errors = ?errors,
                    payload = %batch.to_json(),
                    tags = "send-queue,error",
                    "Batch rejected"
                );
                Ok(CycleOutcome::SendFailed {
                    documents,
                    error: format!("status {}: {}", response.status, errors.join("; ")),
                })
            }
            Err(e) => {
                error!(
                    documents = documents,
                    error = %e,
                    payload = %batch.to_json(),
                    tags = "send-queue,error",
                    "Batch send failed"
                );
                Ok(CycleOutcome::SendFailed {
                    documents,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Pack entries in order until the batch is full.
    ///
    /// Returns the batch, the keys packed into it and the keys of entries that
    /// failed validation. A rejected entry is only requeued by a newer change.
    async fn build_batch(
        &self,
        entries: &[QueuedUpdate],
        version: u64,
    ) -> Result<(Batch, Vec<QueueKey>, Vec<QueueKey>), SyncError> {
        let mut batch = Batch::new();
        let mut included = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();

        for entry in entries {
            let document = self.build_document(entry, version).await?;
            match batch.add_document(&document) {
                Ok(()) => included.push(entry.key()),
                Err(e) if e.is_capacity() => {
                    info!(
                        packed = included.len(),
                        size = batch.size(),
                        tags = "batch-add,notice",
                        "Batch full, remaining entries stay queued"
                    );
                    break;
                }
                Err(e) => {
                    warn!(
                        document_type = %entry.document_type,
                        document_id = %entry.document_id,
                        code = e.code(),
                        error = %e,
                        tags = "batch-add,error",
                        "Document rejected"
                    );
                    rejected.push(entry.key());
                }
            }
        }

        Ok((batch, included, rejected))
    }

    /// The document to send for a queue entry, read from the content store now.
    ///
    /// An `add` entry whose document no longer exists becomes a deletion.
    async fn build_document(
        &self,
        entry: &QueuedUpdate,
        version: u64,
    ) -> Result<SearchDocument, SyncError> {
        let id = document_id(&entry.document_type, &entry.document_id);

        if entry.action == DocumentAction::Delete {
            return Ok(SearchDocument::new(DELETE_TYPE, id, version));
        }

        let fields: Vec<String> = if entry.fields.is_empty() {
            self.config.fields.clone()
        } else {
            entry.fields.iter().cloned().collect()
        };

        let content = self
            .stores
            .content
            .fetch_fields(&entry.document_type, &entry.document_id, &fields)
            .await?;

        let Some(mut values) = content else {
            debug!(
                document_type = %entry.document_type,
                document_id = %entry.document_id,
                "Content gone, sending deletion"
            );
            return Ok(SearchDocument::new(DELETE_TYPE, id, version));
        };

        self.extensions.document_fields(
            &entry.document_type,
            &entry.document_id,
            &entry.fields,
            &mut values,
        );

        Ok(with_fields(SearchDocument::new(ADD_TYPE, id, version), values))
    }

    /// The configured batch interval.
    pub async fn interval(&self) -> Result<Duration, SyncError> {
        batch_interval(self.stores.settings.as_ref()).await
    }

    /// Queue size, last run and next expected run.
    pub async fn status(&self) -> Result<SyncStatus, SyncError> {
        let queued = self.stores.queue.count().await?;
        let interval = self.interval().await?;
        let last_cron_time = self
            .stores
            .settings
            .get(settings_keys::LAST_CRON_TIME)
            .await?
            .and_then(|value| value.parse::<i64>().ok())
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single());

        let next_run = last_cron_time.and_then(|last| {
            chrono::Duration::from_std(interval)
                .ok()
                .map(|interval| last + interval)
        });

        Ok(SyncStatus {
            queued,
            last_cron_time,
            next_run,
            interval,
        })
    }

    /// Drop all sync state: queued entries, run markers and leases.
    pub async fn deactivate(&self) -> Result<(), SyncError> {
        self.stores.queue.clear().await?;
        self.stores
            .settings
            .delete(settings_keys::LAST_CRON_TIME)
            .await?;
        self.stores
            .settings
            .delete(settings_keys::QUEUE_ALL_WATERMARK)
            .await?;
        self.stores.leases.clear(&self.config.lease_key).await?;
        info!(tags = "send-queue,notice", "Sync state cleared");
        Ok(())
    }
}

/// Remote document id: `{type}_{id}`.
pub fn document_id(document_type: &str, document_id: &str) -> String {
    format!("{}_{}", document_type, document_id)
}

fn with_fields(document: SearchDocument, values: BTreeMap<String, Value>) -> SearchDocument {
    values
        .into_iter()
        .fold(document, |document, (name, value)| document.with_field(name, value))
}
