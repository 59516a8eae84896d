//! Document and search service client.
//!
//! Endpoints are read from the settings store on every call so that a refresh
//! of the domain's endpoints takes effect without rebuilding the client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client as ReqwestClient, Method};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use cloudsearch_sync_shared::{Batch, CloudSearchQuery, SearchResponse};

use crate::aws::config_client::host_header;
use crate::aws::payload::FormPayload;
use crate::aws::signer::{content_md5, Credentials, RequestParts, RequestSigner};
use crate::config::{ClientConfig, SERVICE_NAME};
use crate::errors::CloudSearchError;
use crate::interfaces::{DocumentService, SettingsStore};
use crate::types::{settings_keys, BatchResponse};

/// Client for a domain's document and search services.
pub struct CloudSearchDocumentClient {
    http: ReqwestClient,
    signer: RequestSigner,
    credentials: Credentials,
    config: ClientConfig,
    settings: Arc<dyn SettingsStore>,
}

impl CloudSearchDocumentClient {
    pub fn new(
        credentials: Credentials,
        config: ClientConfig,
        settings: Arc<dyn SettingsStore>,
    ) -> Result<Self, CloudSearchError> {
        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CloudSearchError::transport(e.to_string()))?;

        Ok(Self {
            http,
            signer: RequestSigner::new(config.region.clone(), SERVICE_NAME),
            credentials,
            config,
            settings,
        })
    }

    /// Base URL stored under `key`, with `https://` added when it has no scheme.
    async fn endpoint(&self, key: &str) -> Result<Url, CloudSearchError> {
        let stored = self
            .settings
            .get(key)
            .await
            .map_err(|e| CloudSearchError::transport(e.to_string()))?
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| CloudSearchError::validation(format!("No {} configured", key)))?;

        let stored = stored.trim();
        let full = if stored.contains("://") {
            stored.to_string()
        } else {
            format!("https://{}", stored)
        };
        Url::parse(&full).map_err(|e| CloudSearchError::validation(format!("{}: {}", key, e)))
    }

    async fn send_signed(
        &self,
        method: Method,
        url: Url,
        query: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<(reqwest::StatusCode, String), CloudSearchError> {
        let mut headers = headers;
        headers.push(("Host".to_string(), host_header(&url)?));

        let signed = self.signer.sign(
            &self.credentials,
            RequestParts {
                method: method.as_str().to_string(),
                path: url.path().to_string(),
                query,
                headers,
                body,
            },
            Utc::now(),
        );

        let mut request = self.http.request(method, url.clone());
        for (name, value) in &signed.headers {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }
        if !signed.body.is_empty() {
            request = request.body(signed.body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Document service request failed to send");
            CloudSearchError::transport(e.to_string())
        })?;
        let status = response.status();
        let text = response.text().await?;
        debug!(url = %url, status = %status, "Document service response received");
        Ok((status, text))
    }
}

#[async_trait]
impl DocumentService for CloudSearchDocumentClient {
    #[instrument(skip(self, batch), fields(documents = batch.len(), size = batch.size()))]
    async fn send_batch(&self, batch: &Batch) -> Result<BatchResponse, CloudSearchError> {
        let mut url = self.endpoint(settings_keys::DOCUMENT_ENDPOINT).await?;
        url.set_path(&format!("/{}/documents/batch", self.config.api_version));

        let body = batch.to_json().into_bytes();
        let headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
            ("Content-MD5".to_string(), content_md5(&body)),
            ("Accept".to_string(), "application/json".to_string()),
        ];

        let (status, text) = self
            .send_signed(Method::POST, url, String::new(), headers, body)
            .await?;

        // Rejected batches still carry a decodable status and error list.
        match serde_json::from_str::<BatchResponse>(&text) {
            Ok(response) => {
                if response.is_success() {
                    info!(
                        adds = response.adds,
                        deletes = response.deletes,
                        "Batch accepted"
                    );
                } else {
                    warn!(
                        status = %response.status,
                        errors = response.errors.len(),
                        "Batch rejected"
                    );
                }
                Ok(response)
            }
            Err(_) if !status.is_success() => Err(CloudSearchError::Service {
                code: status.as_u16().to_string(),
                message: text,
            }),
            Err(e) => Err(CloudSearchError::parse(format!("batch response: {}", e))),
        }
    }

    #[instrument(skip(self, query))]
    async fn search(&self, query: &CloudSearchQuery) -> Result<SearchResponse, CloudSearchError> {
        let mut url = self.endpoint(settings_keys::SEARCH_ENDPOINT).await?;
        url.set_path(&format!("/{}/search", self.config.search_api_version));

        let mut payload = FormPayload::new();
        for (name, value) in query.to_params() {
            payload.insert(name, value);
        }
        let query_string = payload.canonical_query_string();
        url.set_query(Some(&query_string));

        let headers = vec![("Accept".to_string(), "application/json".to_string())];
        let (status, text) = self
            .send_signed(Method::GET, url, query_string, headers, Vec::new())
            .await?;

        if !status.is_success() {
            return Err(CloudSearchError::Service {
                code: status.as_u16().to_string(),
                message: text,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| CloudSearchError::parse(format!("search response: {}", e)))?;
        Ok(SearchResponse::from_value(&body))
    }
}
