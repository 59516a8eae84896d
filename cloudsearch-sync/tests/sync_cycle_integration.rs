//! Integration tests for the batch sync cycle.
//!
//! These tests run the real BatchSync against in-memory stores and mock
//! remote services.

mod common;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use uuid::Uuid;

use cloudsearch_sync::extensions::{DocumentFieldContributor, Extensions};
use cloudsearch_sync::sync::{BatchSync, CycleOutcome, SyncConfig, BATCH_LEASE_KEY};
use cloudsearch_sync::Stores;
use cloudsearch_sync_repository::{settings_keys, MemoryContentStore};
use cloudsearch_sync_shared::{DocumentAction, DomainStatus, QueuedUpdate};

use common::{at, fields, ready_domain, BatchReply, MockConfigApi, MockDocumentService, DOMAIN};

struct Harness {
    stores: Stores,
    content: Arc<MemoryContentStore>,
    api: Arc<MockConfigApi>,
    documents: Arc<MockDocumentService>,
    sync: BatchSync,
}

async fn harness_with(
    api: MockConfigApi,
    documents: MockDocumentService,
    extensions: Extensions,
) -> Harness {
    let content = Arc::new(MemoryContentStore::new());
    let stores = Stores::in_memory_with_content(content.clone());
    stores
        .settings
        .set(settings_keys::SEARCH_DOMAIN, DOMAIN)
        .await
        .unwrap();

    let api = Arc::new(api);
    let documents = Arc::new(documents);
    let sync = BatchSync::new(
        api.clone(),
        documents.clone(),
        stores.clone(),
        extensions,
        SyncConfig {
            fields: vec!["post_title".to_string(), "post_content".to_string()],
            ..SyncConfig::default()
        },
    );

    Harness {
        stores,
        content,
        api,
        documents,
        sync,
    }
}

async fn harness(documents: MockDocumentService) -> Harness {
    harness_with(
        MockConfigApi::with_domain(ready_domain()),
        documents,
        Extensions::new(),
    )
    .await
}

impl Harness {
    /// Queue an `add` for a post created at `minute` and store its content.
    async fn add_post(&self, id: &str, minute: u32, content: &str) {
        self.content
            .upsert(
                "post",
                id,
                at(minute),
                fields(&[("post_title", id), ("post_content", content)]),
            )
            .await;
        self.enqueue(id, minute, DocumentAction::Add).await;
    }

    async fn enqueue(&self, id: &str, minute: u32, action: DocumentAction) {
        let update = QueuedUpdate::from_parts(
            "post",
            id,
            action,
            BTreeSet::new(),
            at(minute),
            Uuid::new_v4(),
        );
        self.stores.queue.save(&update).await.unwrap();
    }

    async fn queued(&self) -> u64 {
        self.stores.queue.count().await.unwrap()
    }

    async fn lease_holder(&self) -> Option<String> {
        self.stores.leases.holder(BATCH_LEASE_KEY).await.unwrap()
    }

    /// Rebuild the engine to read at most `batch_size` entries per cycle.
    fn set_batch_size(&mut self, batch_size: usize) {
        self.sync = BatchSync::new(
            self.api.clone(),
            self.documents.clone(),
            self.stores.clone(),
            Extensions::new(),
            SyncConfig {
                batch_size,
                fields: vec!["post_title".to_string(), "post_content".to_string()],
                ..SyncConfig::default()
            },
        );
    }

    fn sent_ids(&self) -> Vec<String> {
        self.documents
            .last_batch()
            .iter()
            .map(|doc| doc["id"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[tokio::test]
async fn test_sends_oldest_entries_in_queue_order() {
    let h = harness(MockDocumentService::new()).await;
    h.add_post("c", 3, "third").await;
    h.add_post("a", 1, "first").await;
    h.add_post("b", 2, "second").await;

    let outcome = h.sync.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Sent {
            documents: 3,
            deleted: 3
        }
    );
    assert_eq!(h.sent_ids(), vec!["post_a", "post_b", "post_c"]);

    let batch = h.documents.last_batch();
    assert_eq!(batch[0]["type"], "add");
    assert_eq!(batch[0]["lang"], "en");
    assert_eq!(batch[0]["fields"]["post_content"], "first");
    assert!(batch[0]["version"].as_u64().unwrap() > 1);

    assert_eq!(h.queued().await, 0);
    assert_eq!(h.lease_holder().await, None);
    assert!(h
        .stores
        .settings
        .get(settings_keys::LAST_CRON_TIME)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_content_is_read_at_send_time() {
    let h = harness(MockDocumentService::new()).await;
    h.add_post("1", 1, "draft").await;
    h.content
        .upsert(
            "post",
            "1",
            at(1),
            fields(&[("post_title", "1"), ("post_content", "final")]),
        )
        .await;

    h.sync.run_cycle().await;

    assert_eq!(h.documents.last_batch()[0]["fields"]["post_content"], "final");
}

#[tokio::test]
async fn test_not_ready_domain_skips_cycle() {
    let processing = DomainStatus {
        processing: true,
        ..ready_domain()
    };
    let h = harness_with(
        MockConfigApi::with_domain(processing),
        MockDocumentService::new(),
        Extensions::new(),
    )
    .await;
    h.add_post("1", 1, "body").await;

    assert_eq!(h.sync.run_cycle().await, CycleOutcome::NotReady);
    assert_eq!(h.documents.batch_count(), 0);
    assert_eq!(h.queued().await, 1);
    assert_eq!(h.lease_holder().await, None);
    assert!(h
        .stores
        .settings
        .get(settings_keys::LAST_CRON_TIME)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_missing_domain_setting_skips_cycle() {
    let h = harness(MockDocumentService::new()).await;
    h.stores
        .settings
        .delete(settings_keys::SEARCH_DOMAIN)
        .await
        .unwrap();

    assert_eq!(h.sync.run_cycle().await, CycleOutcome::NotReady);
    assert_eq!(h.api.describe_count(), 0);
}

#[tokio::test]
async fn test_unknown_domain_skips_cycle() {
    let h = harness_with(
        MockConfigApi::default(),
        MockDocumentService::new(),
        Extensions::new(),
    )
    .await;

    assert_eq!(h.sync.run_cycle().await, CycleOutcome::NotReady);
}

#[tokio::test]
async fn test_held_lease_blocks_cycle() {
    let h = harness(MockDocumentService::new()).await;
    h.add_post("1", 1, "body").await;
    h.stores
        .leases
        .insert_if_absent(BATCH_LEASE_KEY, "other-worker", Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(h.sync.run_cycle().await, CycleOutcome::Locked);
    assert_eq!(h.documents.batch_count(), 0);
    assert_eq!(h.queued().await, 1);
    assert_eq!(h.lease_holder().await.as_deref(), Some("other-worker"));
}

#[tokio::test]
async fn test_empty_queue_sends_nothing() {
    let h = harness(MockDocumentService::new()).await;

    assert_eq!(h.sync.run_cycle().await, CycleOutcome::Empty);
    assert_eq!(h.documents.batch_count(), 0);
    assert_eq!(h.lease_holder().await, None);
}

#[tokio::test]
async fn test_full_batch_leaves_remaining_entries_queued() {
    let h = harness(MockDocumentService::new()).await;
    let body = "x".repeat(950_000);
    for minute in 1..=6 {
        h.add_post(&minute.to_string(), minute, &body).await;
    }

    let outcome = h.sync.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Sent {
            documents: 5,
            deleted: 5
        }
    );
    assert_eq!(h.queued().await, 1);
    assert!(h.stores.queue.find("post", "6").await.unwrap().is_some());

    assert_eq!(
        h.sync.run_cycle().await,
        CycleOutcome::Sent {
            documents: 1,
            deleted: 1
        }
    );
    assert_eq!(h.sent_ids(), vec!["post_6"]);
}

#[tokio::test]
async fn test_oversized_document_is_dropped_from_queue() {
    let h = harness(MockDocumentService::new()).await;
    h.add_post("big", 1, &"x".repeat(1_100_000)).await;
    h.add_post("small", 2, "body").await;

    let outcome = h.sync.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Sent {
            documents: 1,
            deleted: 1
        }
    );
    assert_eq!(h.sent_ids(), vec!["post_small"]);
    assert!(h.stores.queue.find("post", "big").await.unwrap().is_none());
    assert_eq!(h.queued().await, 0);
}

#[tokio::test]
async fn test_rejected_entries_do_not_block_the_queue() {
    let mut h = harness(MockDocumentService::new()).await;
    h.set_batch_size(3);
    let body = "x".repeat(1_100_000);
    for minute in 1..=3 {
        h.add_post(&format!("big{}", minute), minute, &body).await;
    }
    h.add_post("small", 4, "body").await;

    assert_eq!(h.sync.run_cycle().await, CycleOutcome::Empty);
    assert_eq!(h.documents.batch_count(), 0);
    assert_eq!(h.queued().await, 1);

    assert_eq!(
        h.sync.run_cycle().await,
        CycleOutcome::Sent {
            documents: 1,
            deleted: 1
        }
    );
    assert_eq!(h.sent_ids(), vec!["post_small"]);
}

#[tokio::test]
async fn test_rejected_batch_keeps_entries() {
    let h = harness(MockDocumentService::replying(BatchReply::Rejected(
        "Validation error for field 'post_title'".to_string(),
    )))
    .await;
    h.add_post("1", 1, "body").await;
    h.add_post("2", 2, "body").await;

    match h.sync.run_cycle().await {
        CycleOutcome::SendFailed { documents, error } => {
            assert_eq!(documents, 2);
            assert!(error.contains("post_title"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.queued().await, 2);
    assert_eq!(h.lease_holder().await, None);
}

#[tokio::test]
async fn test_unreachable_service_keeps_entries() {
    let h = harness(MockDocumentService::replying(BatchReply::Unreachable)).await;
    h.add_post("1", 1, "body").await;

    assert!(matches!(
        h.sync.run_cycle().await,
        CycleOutcome::SendFailed { documents: 1, .. }
    ));
    assert_eq!(h.queued().await, 1);
    assert_eq!(h.lease_holder().await, None);
}

#[tokio::test]
async fn test_entry_changed_during_send_stays_queued() {
    let h = harness(MockDocumentService::new()).await;
    h.add_post("1", 1, "body").await;
    h.add_post("2", 2, "body").await;

    let mut changed = h.stores.queue.find("post", "2").await.unwrap().unwrap();
    assert!(changed.add_field("post_excerpt"));
    *h.documents.during_send.lock().unwrap() = Some((h.stores.queue.clone(), changed));

    let outcome = h.sync.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Sent {
            documents: 2,
            deleted: 1
        }
    );
    let remaining = h.stores.queue.find("post", "2").await.unwrap().unwrap();
    assert!(remaining.fields.contains("post_excerpt"));
}

#[tokio::test]
async fn test_missing_content_and_deletions_become_delete_documents() {
    let h = harness(MockDocumentService::new()).await;
    h.enqueue("gone", 1, DocumentAction::Add).await;
    h.enqueue("trashed", 2, DocumentAction::Delete).await;

    h.sync.run_cycle().await;

    let batch = h.documents.last_batch();
    assert_eq!(batch.len(), 2);
    for doc in &batch {
        assert_eq!(doc["type"], "delete");
        assert!(doc.get("fields").is_none());
    }
    assert_eq!(h.sent_ids(), vec!["post_gone", "post_trashed"]);
    assert_eq!(h.queued().await, 0);
}

struct SiteIdContributor;

impl DocumentFieldContributor for SiteIdContributor {
    fn contribute(
        &self,
        _document_type: &str,
        _document_id: &str,
        _changed_fields: &BTreeSet<String>,
        fields: &mut BTreeMap<String, Value>,
    ) {
        fields.insert("site_id".to_string(), json!(7));
        fields.remove("post_content");
    }
}

#[tokio::test]
async fn test_document_contributors_shape_outgoing_fields() {
    let mut extensions = Extensions::new();
    extensions.register_document_field_contributor(Arc::new(SiteIdContributor));
    let h = harness_with(
        MockConfigApi::with_domain(ready_domain()),
        MockDocumentService::new(),
        extensions,
    )
    .await;
    h.add_post("1", 1, "body").await;

    h.sync.run_cycle().await;

    let doc = &h.documents.last_batch()[0];
    assert_eq!(doc["fields"]["site_id"], 7);
    assert_eq!(doc["fields"]["post_title"], "1");
    assert!(doc["fields"].get("post_content").is_none());
}

#[tokio::test]
async fn test_status_and_deactivate() {
    let h = harness(MockDocumentService::replying(BatchReply::Unreachable)).await;
    h.add_post("1", 1, "body").await;

    let before = h.sync.status().await.unwrap();
    assert_eq!(before.queued, 1);
    assert_eq!(before.last_cron_time, None);
    assert_eq!(before.next_run, None);

    h.sync.run_cycle().await;

    let after = h.sync.status().await.unwrap();
    let last = after.last_cron_time.unwrap();
    assert_eq!(
        after.next_run,
        Some(last + chrono::Duration::from_std(after.interval).unwrap())
    );

    h.sync.deactivate().await.unwrap();
    assert_eq!(h.queued().await, 0);
    assert_eq!(h.sync.status().await.unwrap().last_cron_time, None);
}
