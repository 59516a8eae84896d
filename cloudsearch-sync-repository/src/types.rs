//! Request and response types for the CloudSearch sync repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use cloudsearch_sync_shared::IndexFieldType;

/// Named keys in the settings store.
pub mod settings_keys {
    pub const ACCESS_KEY_ID: &str = "access-key-id";
    pub const SECRET_ACCESS_KEY: &str = "secret-access-key";
    pub const SEARCH_DOMAIN: &str = "search-domain";
    pub const SEARCH_ENDPOINT: &str = "search-endpoint";
    pub const DOCUMENT_ENDPOINT: &str = "document-endpoint";
    pub const BATCH_INTERVAL: &str = "batch-interval";
    pub const LAST_CRON_TIME: &str = "last-cron-time";
    pub const QUEUE_ALL_WATERMARK: &str = "queue-all-watermark";
}

/// An `Error` object returned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: String,
    pub message: String,
    pub error_type: Option<String>,
}

impl RemoteError {
    /// Extract the `Error` object from a response body, if there is one.
    pub fn from_response(body: &Value) -> Option<Self> {
        let error = body.get("Error")?;
        let field = |name: &str| error.get(name).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            code: field("Code").unwrap_or_else(|| "Unknown".to_string()),
            message: field("Message").unwrap_or_default(),
            error_type: field("Type"),
        })
    }
}

/// Result of submitting a document batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub status: String,
    #[serde(default)]
    pub adds: u64,
    #[serde(default)]
    pub deletes: u64,
    #[serde(default)]
    pub errors: Vec<BatchMessage>,
    #[serde(default)]
    pub warnings: Vec<BatchMessage>,
}

impl BatchResponse {
    /// Whether the service accepted the whole batch.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// A message attached to a batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMessage {
    pub message: String,
}

/// A document listed by the content store during a full sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub document_type: String,
    pub document_id: String,
    pub created_at: DateTime<Utc>,
}

/// An index field as currently defined on the remote domain.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexFieldStatus {
    pub name: String,
    pub field_type: Option<IndexFieldType>,
    pub state: Option<String>,
}

/// A service access policy document.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPolicy {
    pub statements: Vec<AccessPolicyStatement>,
}

/// One allow statement of an access policy.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPolicyStatement {
    pub resource: String,
    pub source_ip: String,
}

impl AccessPolicy {
    /// Allow every action on each resource from a single network.
    pub fn allow_from(resources: &[&str], network: &str) -> Self {
        Self {
            statements: resources
                .iter()
                .map(|resource| AccessPolicyStatement {
                    resource: resource.to_string(),
                    source_ip: network.to_string(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The policy document in the service's JSON format.
    pub fn to_json(&self) -> Value {
        let statements: Vec<Value> = self
            .statements
            .iter()
            .map(|statement| {
                json!({
                    "Effect": "Allow",
                    "Action": "*",
                    "Resource": statement.resource,
                    "Condition": {
                        "IpAddress": {
                            "aws:SourceIp": [statement.source_ip]
                        }
                    }
                })
            })
            .collect();
        json!({ "Statement": statements })
    }
}

/// Access policies as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPoliciesStatus {
    pub options: String,
    pub state: String,
}
