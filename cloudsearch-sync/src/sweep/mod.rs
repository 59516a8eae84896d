//! Queue-all sweep.
//!
//! Pages backward through the whole content corpus, newest first, and queues
//! a full-document update for every item. Progress is a watermark timestamp
//! stored in the settings store; the sweep is running while the watermark is
//! set and finishes by clearing it.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info, instrument, warn};

use cloudsearch_sync_repository::settings_keys;

use crate::config::Stores;
use crate::errors::SyncError;
use crate::queue::UpdateQueue;
use crate::sync::lease;

/// Lease key shared by every sweep worker.
pub const SWEEP_LEASE_KEY: &str = "cloudsearch-queue-all-lock";

/// Configuration for the queue-all sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Document types included in the sweep.
    pub document_types: Vec<String>,
    /// Fields queued for every document.
    pub fields: Vec<String>,
    pub page_size: usize,
    pub lease_key: String,
    pub lease_ttl: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            document_types: vec!["post".to_string(), "page".to_string()],
            fields: Vec::new(),
            page_size: 100,
            lease_key: SWEEP_LEASE_KEY.to_string(),
            lease_ttl: Duration::from_secs(300),
        }
    }
}

/// How a sweep page ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepOutcome {
    /// No sweep is running.
    Idle,
    /// Another worker is processing a page.
    Locked,
    /// A page was queued and the watermark moved to `watermark`.
    Page {
        queued: usize,
        watermark: DateTime<Utc>,
    },
    /// The corpus is exhausted and the watermark was cleared.
    Finished,
    /// The page stopped on an unexpected error; the watermark is unchanged.
    Failed(String),
}

/// Re-queues the full corpus one page at a time.
pub struct QueueAllSweep {
    stores: Stores,
    config: SweepConfig,
}

impl QueueAllSweep {
    pub fn new(stores: Stores, config: SweepConfig) -> Self {
        Self { stores, config }
    }

    /// Start (or restart) a sweep from the current time.
    pub async fn start(&self) -> Result<(), SyncError> {
        let now = Utc::now();
        self.write_watermark(now).await?;
        info!(watermark = %now, tags = "queue-all,notice", "Queue-all sweep started");
        Ok(())
    }

    /// Stop the sweep.
    pub async fn cancel(&self) -> Result<(), SyncError> {
        self.stores
            .settings
            .delete(settings_keys::QUEUE_ALL_WATERMARK)
            .await?;
        info!(tags = "queue-all,notice", "Queue-all sweep cancelled");
        Ok(())
    }

    pub async fn is_running(&self) -> Result<bool, SyncError> {
        Ok(self.watermark().await?.is_some())
    }

    /// Current watermark. An unreadable value counts as no sweep.
    pub async fn watermark(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        let Some(raw) = self
            .stores
            .settings
            .get(settings_keys::QUEUE_ALL_WATERMARK)
            .await?
        else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(watermark) => Ok(Some(watermark.with_timezone(&Utc))),
            Err(e) => {
                warn!(watermark = %raw, error = %e, "Unreadable queue-all watermark");
                Ok(None)
            }
        }
    }

    /// Queue one page of documents older than the watermark.
    ///
    /// Never fails: errors are logged and reported as [`SweepOutcome::Failed`].
    #[instrument(skip(self))]
    pub async fn run_page(&self) -> SweepOutcome {
        match self.try_page().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, tags = "queue-all,error", "Queue-all page failed");
                SweepOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_page(&self) -> Result<SweepOutcome, SyncError> {
        if self.watermark().await?.is_none() {
            // Also drops an unreadable value.
            self.stores
                .settings
                .delete(settings_keys::QUEUE_ALL_WATERMARK)
                .await?;
            return Ok(SweepOutcome::Idle);
        }

        let leases = self.stores.leases.as_ref();
        let Some(token) =
            lease::acquire(leases, &self.config.lease_key, self.config.lease_ttl).await?
        else {
            info!(lease = %self.config.lease_key, "Queue-all page already running elsewhere");
            return Ok(SweepOutcome::Locked);
        };

        let result = self.locked_page().await;

        if let Err(e) = leases.release(&self.config.lease_key, &token).await {
            error!(lease = %self.config.lease_key, error = %e, "Failed to release sweep lease");
        }

        result
    }

    async fn locked_page(&self) -> Result<SweepOutcome, SyncError> {
        // Re-read under the lease: another worker may have finished the sweep.
        let Some(watermark) = self.watermark().await? else {
            return Ok(SweepOutcome::Idle);
        };

        let items = self
            .stores
            .content
            .page_before(&self.config.document_types, watermark, self.config.page_size)
            .await?;

        let Some(last) = items.last() else {
            self.stores
                .settings
                .delete(settings_keys::QUEUE_ALL_WATERMARK)
                .await?;
            info!(tags = "queue-all,success", "Queue-all sweep finished");
            return Ok(SweepOutcome::Finished);
        };
        let next_watermark = last.created_at;

        let mut queue = UpdateQueue::new(self.stores.queue.clone());
        let mut queued = 0;
        for item in &items {
            if queue
                .queue_full_document(&item.document_id, &item.document_type, &self.config.fields)
                .await?
            {
                queued += 1;
            }
        }
        queue.flush().await?;

        self.write_watermark(next_watermark).await?;
        info!(
            queued = queued,
            page = items.len(),
            watermark = %next_watermark,
            tags = "queue-all,notice",
            "Queue-all page queued"
        );

        Ok(SweepOutcome::Page {
            queued,
            watermark: next_watermark,
        })
    }

    async fn write_watermark(&self, watermark: DateTime<Utc>) -> Result<(), SyncError> {
        self.stores
            .settings
            .set(
                settings_keys::QUEUE_ALL_WATERMARK,
                &watermark.to_rfc3339_opts(SecondsFormat::Micros, true),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::TimeZone;
    use cloudsearch_sync_repository::MemoryContentStore;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    async fn sweep_over(hours: &[u32], page_size: usize) -> QueueAllSweep {
        let content = Arc::new(MemoryContentStore::new());
        for hour in hours {
            content
                .upsert("post", &hour.to_string(), at(*hour), BTreeMap::new())
                .await;
        }
        let config = SweepConfig {
            fields: vec!["post_title".to_string()],
            page_size,
            ..SweepConfig::default()
        };
        QueueAllSweep::new(Stores::in_memory_with_content(content), config)
    }

    #[tokio::test]
    async fn test_idle_without_watermark() {
        let sweep = sweep_over(&[1], 10).await;
        assert_eq!(sweep.run_page().await, SweepOutcome::Idle);
        assert_eq!(sweep.stores.queue.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pages_until_exhausted() {
        let sweep = sweep_over(&[1, 2, 3, 4, 5], 2).await;
        sweep.start().await.unwrap();

        assert_eq!(
            sweep.run_page().await,
            SweepOutcome::Page {
                queued: 2,
                watermark: at(4)
            }
        );
        assert_eq!(
            sweep.run_page().await,
            SweepOutcome::Page {
                queued: 2,
                watermark: at(2)
            }
        );
        assert_eq!(
            sweep.run_page().await,
            SweepOutcome::Page {
                queued: 1,
                watermark: at(1)
            }
        );
        assert_eq!(sweep.run_page().await, SweepOutcome::Finished);
        assert!(!sweep.is_running().await.unwrap());

        assert_eq!(sweep.stores.queue.count().await.unwrap(), 5);
        let entry = sweep.stores.queue.find("post", "3").await.unwrap().unwrap();
        assert!(entry.fields.contains("post_title"));
    }

    #[tokio::test]
    async fn test_cancel_stops_sweep() {
        let sweep = sweep_over(&[1, 2], 1).await;
        sweep.start().await.unwrap();
        sweep.cancel().await.unwrap();
        assert_eq!(sweep.run_page().await, SweepOutcome::Idle);
    }

    #[tokio::test]
    async fn test_locked_while_another_worker_pages() {
        let sweep = sweep_over(&[1], 10).await;
        sweep.start().await.unwrap();
        sweep
            .stores
            .leases
            .insert_if_absent(SWEEP_LEASE_KEY, "other", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(sweep.run_page().await, SweepOutcome::Locked);
        assert_eq!(sweep.stores.queue.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_watermark_is_cleared() {
        let sweep = sweep_over(&[1], 10).await;
        sweep
            .stores
            .settings
            .set(settings_keys::QUEUE_ALL_WATERMARK, "yesterday")
            .await
            .unwrap();

        assert_eq!(sweep.run_page().await, SweepOutcome::Idle);
        assert_eq!(
            sweep
                .stores
                .settings
                .get(settings_keys::QUEUE_ALL_WATERMARK)
                .await
                .unwrap(),
            None
        );
    }
}
