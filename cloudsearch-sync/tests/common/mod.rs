//! Mock remote services shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use cloudsearch_sync_repository::{
    AccessPoliciesStatus, AccessPolicy, BatchMessage, BatchResponse, CloudSearchError, ConfigApi,
    DocumentService, IndexFieldStatus, QueueStore, RemoteError,
};
use cloudsearch_sync_shared::{
    Batch, CloudSearchQuery, DomainStatus, IndexField, QueuedUpdate, SearchResponse,
    ServiceEndpoint,
};

pub const DOMAIN: &str = "wp-content";

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
}

pub fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect()
}

/// A domain that is created, has both services and one search instance.
pub fn ready_domain() -> DomainStatus {
    DomainStatus {
        domain_name: DOMAIN.to_string(),
        created: true,
        search_instance_count: 1,
        doc_service: Some(ServiceEndpoint {
            arn: Some("arn:aws:cs:us-east-1:1:doc/wp-content".to_string()),
            endpoint: Some("doc-wp-content.example.com".to_string()),
        }),
        search_service: Some(ServiceEndpoint {
            arn: Some("arn:aws:cs:us-east-1:1:search/wp-content".to_string()),
            endpoint: Some("search-wp-content.example.com".to_string()),
        }),
        ..DomainStatus::default()
    }
}

// Mock configuration API for testing
#[derive(Default)]
pub struct MockConfigApi {
    pub domain: Mutex<Option<DomainStatus>>,
    /// Describe calls a new domain answers with `created: false`.
    pub creation_polls: Mutex<u32>,
    pub reject_credentials: bool,
    pub existing_fields: Mutex<Vec<IndexFieldStatus>>,
    pub failing_fields: Vec<String>,
    pub defined_fields: Mutex<Vec<IndexField>>,
    pub index_calls: Mutex<u32>,
    pub policies: Mutex<Vec<AccessPolicy>>,
    pub describe_calls: Mutex<u32>,
}

impl MockConfigApi {
    pub fn with_domain(status: DomainStatus) -> Self {
        Self {
            domain: Mutex::new(Some(status)),
            ..Self::default()
        }
    }

    pub fn describe_count(&self) -> u32 {
        *self.describe_calls.lock().unwrap()
    }

    pub fn defined_names(&self) -> Vec<String> {
        self.defined_fields
            .lock()
            .unwrap()
            .iter()
            .map(|field| field.name.clone())
            .collect()
    }
}

#[async_trait]
impl ConfigApi for MockConfigApi {
    async fn describe_domains(
        &self,
        names: &[String],
    ) -> Result<Vec<DomainStatus>, CloudSearchError> {
        *self.describe_calls.lock().unwrap() += 1;
        if self.reject_credentials {
            return Err(CloudSearchError::NotAuthenticated(
                "The security token included in the request is invalid".to_string(),
            ));
        }

        let mut domain = self.domain.lock().unwrap();
        let Some(status) = domain.as_mut() else {
            return Ok(Vec::new());
        };
        if !status.created {
            let mut polls = self.creation_polls.lock().unwrap();
            if *polls == 0 {
                *status = ready_domain();
            } else {
                *polls -= 1;
            }
        }

        if names.is_empty() || names.iter().any(|name| *name == status.domain_name) {
            Ok(vec![status.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn create_domain(&self, name: &str) -> Result<DomainStatus, CloudSearchError> {
        let status = DomainStatus {
            domain_name: name.to_string(),
            ..DomainStatus::default()
        };
        *self.domain.lock().unwrap() = Some(status.clone());
        Ok(status)
    }

    async fn describe_index_fields(
        &self,
        _domain: &str,
    ) -> Result<Vec<IndexFieldStatus>, CloudSearchError> {
        Ok(self.existing_fields.lock().unwrap().clone())
    }

    async fn define_index_field(
        &self,
        _domain: &str,
        field: &IndexField,
    ) -> Result<(), CloudSearchError> {
        if self.failing_fields.contains(&field.name) {
            return Err(CloudSearchError::Service {
                code: "InvalidType".to_string(),
                message: format!("cannot define {}", field.name),
            });
        }
        self.defined_fields.lock().unwrap().push(field.clone());
        if let Some(status) = self.domain.lock().unwrap().as_mut() {
            status.requires_index_documents = true;
        }
        Ok(())
    }

    async fn define_rank_expression(
        &self,
        _domain: &str,
        _name: &str,
        _expression: &str,
    ) -> Result<(), CloudSearchError> {
        Ok(())
    }

    async fn delete_rank_expression(
        &self,
        _domain: &str,
        _name: &str,
    ) -> Result<(), CloudSearchError> {
        Ok(())
    }

    async fn describe_service_access_policies(
        &self,
        _domain: &str,
    ) -> Result<AccessPoliciesStatus, CloudSearchError> {
        Ok(AccessPoliciesStatus {
            options: String::new(),
            state: "Active".to_string(),
        })
    }

    async fn update_service_access_policies(
        &self,
        _domain: &str,
        policy: &AccessPolicy,
    ) -> Result<(), CloudSearchError> {
        self.policies.lock().unwrap().push(policy.clone());
        Ok(())
    }

    async fn index_documents(&self, _domain: &str) -> Result<(), CloudSearchError> {
        *self.index_calls.lock().unwrap() += 1;
        if let Some(status) = self.domain.lock().unwrap().as_mut() {
            status.requires_index_documents = false;
        }
        Ok(())
    }

    async fn egress_ip(&self) -> Option<String> {
        Some("203.0.113.9".to_string())
    }

    fn last_error(&self) -> Option<RemoteError> {
        None
    }
}

/// What the mock document service answers to a batch.
#[derive(Clone)]
pub enum BatchReply {
    Success,
    Rejected(String),
    Unreachable,
}

// Mock document service for testing
pub struct MockDocumentService {
    pub reply: Mutex<BatchReply>,
    pub batches: Mutex<Vec<Value>>,
    pub queries: Mutex<Vec<CloudSearchQuery>>,
    /// Record saved to the queue while the batch is in flight.
    pub during_send: Mutex<Option<(Arc<dyn QueueStore>, QueuedUpdate)>>,
}

impl MockDocumentService {
    pub fn new() -> Self {
        Self::replying(BatchReply::Success)
    }

    pub fn replying(reply: BatchReply) -> Self {
        Self {
            reply: Mutex::new(reply),
            batches: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            during_send: Mutex::new(None),
        }
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    /// Documents of the most recent batch.
    pub fn last_batch(&self) -> Vec<Value> {
        self.batches
            .lock()
            .unwrap()
            .last()
            .and_then(|batch| batch.as_array().cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentService for MockDocumentService {
    async fn send_batch(&self, batch: &Batch) -> Result<BatchResponse, CloudSearchError> {
        let payload: Value = serde_json::from_str(&batch.to_json())
            .map_err(|e| CloudSearchError::serialization(e.to_string()))?;
        self.batches.lock().unwrap().push(payload);

        let concurrent = self.during_send.lock().unwrap().take();
        if let Some((queue, update)) = concurrent {
            queue
                .save(&update)
                .await
                .map_err(|e| CloudSearchError::transport(e.to_string()))?;
        }

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            BatchReply::Success => Ok(BatchResponse {
                status: "success".to_string(),
                adds: batch.len() as u64,
                ..BatchResponse::default()
            }),
            BatchReply::Rejected(message) => Ok(BatchResponse {
                status: "error".to_string(),
                errors: vec![BatchMessage { message }],
                ..BatchResponse::default()
            }),
            BatchReply::Unreachable => {
                Err(CloudSearchError::transport("connection refused"))
            }
        }
    }

    async fn search(&self, query: &CloudSearchQuery) -> Result<SearchResponse, CloudSearchError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(SearchResponse::from_value(&serde_json::json!({
            "hits": {
                "found": 1,
                "start": 0,
                "hit": [{ "id": "post_1" }]
            }
        })))
    }
}
