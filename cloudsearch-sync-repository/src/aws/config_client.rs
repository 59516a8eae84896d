//! Configuration API client.
//!
//! This module provides the concrete implementation of [`ConfigApi`] on top of
//! the SigV4 signer and `reqwest`.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use cloudsearch_sync_shared::{DomainStatus, IndexField};

use crate::aws::payload::FormPayload;
use crate::aws::signer::{Credentials, RequestSigner};
use crate::config::{ClientConfig, SERVICE_NAME};
use crate::errors::CloudSearchError;
use crate::interfaces::ConfigApi;
use crate::types::{AccessPoliciesStatus, AccessPolicy, IndexFieldStatus, RemoteError};

/// State the service reports after accepting an access policy change.
const PROCESSING_STATE: &str = "Processing";

/// Configuration API client.
///
/// # Example
///
/// ```ignore
/// use cloudsearch_sync_repository::{ClientConfig, CloudSearchConfigClient, ConfigApi, Credentials};
///
/// let client = CloudSearchConfigClient::new(
///     Credentials::new("AKID", "secret"),
///     ClientConfig::default(),
/// )?;
/// let domain = client.describe_domain("my-domain").await?;
/// ```
pub struct CloudSearchConfigClient {
    http: ReqwestClient,
    endpoint: Url,
    host: String,
    config: ClientConfig,
    signer: RequestSigner,
    credentials: Credentials,
    last_error: Mutex<Option<RemoteError>>,
}

impl CloudSearchConfigClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Arguments
    ///
    /// * `credentials` - Key pair used to sign every request
    /// * `config` - Endpoint, API version, region and timeout
    ///
    /// # Returns
    ///
    /// * `Ok(CloudSearchConfigClient)` - A new client
    /// * `Err(CloudSearchError)` - If the endpoint is not a valid URL
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, CloudSearchError> {
        let endpoint = Url::parse(&config.config_endpoint)
            .map_err(|e| CloudSearchError::validation(format!("Invalid endpoint: {}", e)))?;
        let host = host_header(&endpoint)?;

        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CloudSearchError::transport(e.to_string()))?;

        info!(
            endpoint = %endpoint,
            region = %config.region,
            api_version = %config.api_version,
            "Created CloudSearch configuration client"
        );

        Ok(Self {
            http,
            endpoint,
            host,
            signer: RequestSigner::new(config.region.clone(), SERVICE_NAME),
            config,
            credentials,
            last_error: Mutex::new(None),
        })
    }

    fn record_error(&self, error: RemoteError) {
        if let Ok(mut last_error) = self.last_error.lock() {
            *last_error = Some(error);
        }
    }

    /// Sign and send an action, returning the decoded JSON body.
    ///
    /// A body carrying an `Error` object is recorded as the last error and turned
    /// into the matching [`CloudSearchError`].
    async fn request(&self, action: &str, payload: FormPayload) -> Result<Value, CloudSearchError> {
        let signed = self.signer.sign_action(
            &self.credentials,
            &self.host,
            action,
            &self.config.api_version,
            &payload,
            Utc::now(),
        );

        let mut request = self.http.post(self.endpoint.clone());
        for (name, value) in &signed.headers {
            // reqwest derives it from the body.
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(signed.body).send().await.map_err(|e| {
            warn!(action = %action, error = %e, "Configuration request failed to send");
            CloudSearchError::transport(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().await?;
        debug!(action = %action, status = %status, "Configuration response received");

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(status_error(status, &text)),
            Err(e) => return Err(CloudSearchError::parse(format!("{}: {}", action, e))),
        };

        if let Some(remote) = RemoteError::from_response(&body) {
            warn!(
                action = %action,
                code = %remote.code,
                message = %remote.message,
                "Configuration request returned an error"
            );
            let error = CloudSearchError::from_remote(&remote);
            self.record_error(remote);
            return Err(error);
        }

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        Ok(body)
    }
}

#[async_trait]
impl ConfigApi for CloudSearchConfigClient {
    #[instrument(skip(self))]
    async fn describe_domains(
        &self,
        names: &[String],
    ) -> Result<Vec<DomainStatus>, CloudSearchError> {
        let mut payload = FormPayload::new();
        payload.insert_members("DomainNames", names);

        let body = self.request("DescribeDomains", payload).await?;
        let list = result(&body, "DescribeDomains")?
            .get("DomainStatusList")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));

        serde_json::from_value(list).map_err(|e| CloudSearchError::parse(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn create_domain(&self, name: &str) -> Result<DomainStatus, CloudSearchError> {
        let payload = FormPayload::new().with("DomainName", name);
        let body = self.request("CreateDomain", payload).await?;

        let status = result(&body, "CreateDomain")?
            .get("DomainStatus")
            .cloned()
            .ok_or_else(|| CloudSearchError::parse("CreateDomain: missing DomainStatus"))?;

        info!(domain = %name, "Domain created");
        serde_json::from_value(status).map_err(|e| CloudSearchError::parse(e.to_string()))
    }

    async fn describe_index_fields(
        &self,
        domain: &str,
    ) -> Result<Vec<IndexFieldStatus>, CloudSearchError> {
        let payload = FormPayload::new().with("DomainName", domain);
        let body = self.request("DescribeIndexFields", payload).await?;

        let fields = result(&body, "DescribeIndexFields")?
            .get("IndexFields")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(fields
            .iter()
            .filter_map(|field| {
                let options = field.get("Options")?;
                Some(IndexFieldStatus {
                    name: options.get("IndexFieldName")?.as_str()?.to_string(),
                    field_type: options
                        .get("IndexFieldType")
                        .and_then(Value::as_str)
                        .and_then(|t| t.parse().ok()),
                    state: field
                        .pointer("/Status/State")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect())
    }

    #[instrument(skip(self, field), fields(field = %field.name, field_type = %field.field_type))]
    async fn define_index_field(
        &self,
        domain: &str,
        field: &IndexField,
    ) -> Result<(), CloudSearchError> {
        let options_name = field.field_type.options_name();
        let mut payload = FormPayload::new()
            .with("DomainName", domain)
            .with("IndexField.IndexFieldName", field.name.as_str())
            .with("IndexField.IndexFieldType", field.field_type.as_str());
        for (option, value) in field.options() {
            payload.insert(format!("IndexField.{}.{}", options_name, option), value);
        }

        let body = self.request("DefineIndexField", payload).await?;
        if result(&body, "DefineIndexField")?.get("IndexField").is_none() {
            return Err(CloudSearchError::parse("DefineIndexField: missing IndexField"));
        }
        Ok(())
    }

    async fn define_rank_expression(
        &self,
        domain: &str,
        name: &str,
        expression: &str,
    ) -> Result<(), CloudSearchError> {
        let payload = FormPayload::new()
            .with("DomainName", domain)
            .with("RankExpression.RankName", name)
            .with("RankExpression.RankExpression", expression);

        let body = self.request("DefineRankExpression", payload).await?;
        if result(&body, "DefineRankExpression")?
            .get("RankExpression")
            .is_none()
        {
            return Err(CloudSearchError::parse(
                "DefineRankExpression: missing RankExpression",
            ));
        }
        Ok(())
    }

    async fn delete_rank_expression(
        &self,
        domain: &str,
        name: &str,
    ) -> Result<(), CloudSearchError> {
        let payload = FormPayload::new()
            .with("DomainName", domain)
            .with("RankName", name);

        let body = self.request("DeleteRankExpression", payload).await?;
        if result(&body, "DeleteRankExpression")?
            .get("RankExpression")
            .is_none()
        {
            return Err(CloudSearchError::parse(
                "DeleteRankExpression: missing RankExpression",
            ));
        }
        Ok(())
    }

    async fn describe_service_access_policies(
        &self,
        domain: &str,
    ) -> Result<AccessPoliciesStatus, CloudSearchError> {
        let payload = FormPayload::new().with("DomainName", domain);
        let body = self
            .request("DescribeServiceAccessPolicies", payload)
            .await?;

        let policies = result(&body, "DescribeServiceAccessPolicies")?
            .get("AccessPolicies")
            .ok_or_else(|| {
                CloudSearchError::parse("DescribeServiceAccessPolicies: missing AccessPolicies")
            })?;
        Ok(access_policies_status(policies))
    }

    #[instrument(skip(self, policy), fields(statements = policy.statements.len()))]
    async fn update_service_access_policies(
        &self,
        domain: &str,
        policy: &AccessPolicy,
    ) -> Result<(), CloudSearchError> {
        if policy.is_empty() {
            return Err(CloudSearchError::validation("Access policy has no statements"));
        }

        let payload = FormPayload::new()
            .with("DomainName", domain)
            .with("AccessPolicies", policy.to_json().to_string());

        let body = self
            .request("UpdateServiceAccessPolicies", payload)
            .await?;
        let policies = result(&body, "UpdateServiceAccessPolicies")?
            .get("AccessPolicies")
            .ok_or_else(|| {
                CloudSearchError::parse("UpdateServiceAccessPolicies: missing AccessPolicies")
            })?;

        // The service echoes empty options for a request it could not apply.
        let status = access_policies_status(policies);
        let options_valid = serde_json::from_str::<Value>(&status.options)
            .map(|options| !options.is_null())
            .unwrap_or(false);
        if !options_valid || status.state != PROCESSING_STATE {
            return Err(CloudSearchError::malformed(format!(
                "access policy update for {} returned state '{}'",
                domain, status.state
            )));
        }

        info!(domain = %domain, "Access policies updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn index_documents(&self, domain: &str) -> Result<(), CloudSearchError> {
        let payload = FormPayload::new().with("DomainName", domain);
        self.request("IndexDocuments", payload).await?;
        info!(domain = %domain, "Document indexing requested");
        Ok(())
    }

    async fn egress_ip(&self) -> Option<String> {
        let response = match self.http.get(&self.config.egress_ip_lookup_url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "Egress IP lookup failed");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "Egress IP lookup failed");
                return None;
            }
        };

        let text = response.text().await.ok()?;
        let ip = text.trim();
        ip.parse::<std::net::IpAddr>().ok().map(|_| ip.to_string())
    }

    fn last_error(&self) -> Option<RemoteError> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }
}

/// `{Action}Response.{Action}Result` of a response body.
fn result<'a>(body: &'a Value, action: &str) -> Result<&'a Value, CloudSearchError> {
    body.get(format!("{}Response", action))
        .and_then(|response| response.get(format!("{}Result", action)))
        .ok_or_else(|| CloudSearchError::parse(format!("{}: missing result", action)))
}

fn access_policies_status(policies: &Value) -> AccessPoliciesStatus {
    AccessPoliciesStatus {
        options: policies
            .get("Options")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        state: policies
            .pointer("/Status/State")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn status_error(status: reqwest::StatusCode, body: &str) -> CloudSearchError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        CloudSearchError::NotAuthenticated(format!("HTTP {}", status.as_u16()))
    } else {
        CloudSearchError::Service {
            code: status.as_u16().to_string(),
            message: body.to_string(),
        }
    }
}

/// Lowercased `host[:port]` of a URL.
pub(crate) fn host_header(url: &Url) -> Result<String, CloudSearchError> {
    let host = url
        .host_str()
        .ok_or_else(|| CloudSearchError::validation(format!("URL has no host: {}", url)))?
        .to_lowercase();
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsearch_sync_shared::IndexFieldType;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> CloudSearchConfigClient {
        let config = ClientConfig {
            egress_ip_lookup_url: format!("{}/ip", server.uri()),
            ..ClientConfig::with_endpoint(server.uri())
        };
        CloudSearchConfigClient::new(Credentials::new("AKID", "secret"), config).unwrap()
    }

    fn domain_status_json(name: &str) -> Value {
        json!({
            "DomainName": name,
            "Created": true,
            "Deleted": false,
            "Processing": false,
            "RequiresIndexDocuments": false,
            "SearchInstanceCount": 1,
            "DocService": {"Arn": "arn:doc", "Endpoint": "doc.example.com"},
            "SearchService": {"Arn": "arn:search", "Endpoint": "search.example.com"}
        })
    }

    #[tokio::test]
    async fn test_describe_domains_sends_signed_members() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header_exists("content-md5"))
            .and(body_string_contains("Action=DescribeDomains"))
            .and(body_string_contains("DomainNames.member.1=lift"))
            .and(body_string_contains("Version=2011-02-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DescribeDomainsResponse": {
                    "DescribeDomainsResult": {"DomainStatusList": [domain_status_json("lift")]}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let domains = client.describe_domains(&["lift".to_string()]).await.unwrap();

        assert_eq!(domains.len(), 1);
        assert!(domains[0].is_ready());
        assert_eq!(domains[0].document_endpoint(), Some("doc.example.com"));
    }

    #[tokio::test]
    async fn test_error_object_is_recorded_and_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "Error": {
                    "Code": "InvalidClientTokenId",
                    "Message": "The security token included in the request is invalid",
                    "Type": "Sender"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.last_error().is_none());

        let err = client.describe_domains(&[]).await.unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(
            client.last_error().map(|e| e.code),
            Some("InvalidClientTokenId".to_string())
        );
        assert!(!client.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_domain_is_domain_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "Error": {"Code": "ResourceNotFound", "Message": "Domain not found: lift"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.index_documents("lift").await.unwrap_err();
        assert!(matches!(err, CloudSearchError::DomainNotFound(_)));
    }

    #[tokio::test]
    async fn test_no_response_is_transport_error() {
        let config = ClientConfig::with_endpoint("http://127.0.0.1:1");
        let client =
            CloudSearchConfigClient::new(Credentials::new("AKID", "secret"), config).unwrap();

        let err = client.describe_domains(&[]).await.unwrap_err();
        assert!(matches!(err, CloudSearchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_define_index_field_sends_type_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DefineIndexField"))
            .and(body_string_contains("IndexField.IndexFieldType=literal"))
            .and(body_string_contains(
                "IndexField.LiteralOptions.FacetEnabled=true",
            ))
            .and(body_string_contains(
                "IndexField.LiteralOptions.SearchEnabled=false",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DefineIndexFieldResponse": {
                    "DefineIndexFieldResult": {"IndexField": {"Options": {}, "Status": {}}}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .define_index_field("lift", &IndexField::literal("post_type").facet(true))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_schema_stops_at_first_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("IndexField.IndexFieldName=post_title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DefineIndexFieldResponse": {"DefineIndexFieldResult": {"IndexField": {}}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("IndexField.IndexFieldName=post_content"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "Error": {"Code": "InvalidParameterValue", "Message": "bad field"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("IndexField.IndexFieldName=post_excerpt"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let schema = vec![
            IndexField::text("post_title"),
            IndexField::text("post_content"),
            IndexField::text("post_excerpt"),
        ];
        let err = client.load_schema("lift", &schema).await.unwrap_err();

        assert!(matches!(err, CloudSearchError::Service { ref code, .. } if code == "InvalidParameterValue"));
    }

    #[tokio::test]
    async fn test_describe_index_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeIndexFields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DescribeIndexFieldsResponse": {"DescribeIndexFieldsResult": {"IndexFields": [
                    {"Options": {"IndexFieldName": "post_title", "IndexFieldType": "text"},
                     "Status": {"State": "Active"}},
                    {"Options": {"IndexFieldName": "post_date_gmt", "IndexFieldType": "uint"},
                     "Status": {"State": "RequiresIndexDocuments"}}
                ]}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let fields = client.describe_index_fields("lift").await.unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].name, "post_date_gmt");
        assert_eq!(fields[1].field_type, Some(IndexFieldType::Uint));
        assert_eq!(fields[1].state.as_deref(), Some("RequiresIndexDocuments"));
    }

    #[tokio::test]
    async fn test_access_policy_update_requires_processing_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=UpdateServiceAccessPolicies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UpdateServiceAccessPoliciesResponse": {"UpdateServiceAccessPoliciesResult": {
                    "AccessPolicies": {"Options": "", "Status": {"State": "Active"}}
                }}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let policy = AccessPolicy::allow_from(&["arn:search"], "0.0.0.0/0");
        let err = client
            .update_service_access_policies("lift", &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudSearchError::MalformedRequest(_)));

        let err = client
            .update_service_access_policies("lift", &AccessPolicy { statements: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, CloudSearchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_access_policy_update_accepted() {
        let server = MockServer::start().await;
        let options = json!({"Statement": []}).to_string();
        Mock::given(method("POST"))
            .and(body_string_contains("AccessPolicies=%7B%22Statement%22"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UpdateServiceAccessPoliciesResponse": {"UpdateServiceAccessPoliciesResult": {
                    "AccessPolicies": {"Options": options, "Status": {"State": "Processing"}}
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let policy = AccessPolicy::allow_from(&["arn:search"], "10.0.0.1/32");
        client
            .update_service_access_policies("lift", &policy)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_default_policy_uses_egress_ip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeDomains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DescribeDomainsResponse": {
                    "DescribeDomainsResult": {"DomainStatusList": [domain_status_json("lift")]}
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let policy = client
            .default_service_access_policy("lift")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(policy.statements.len(), 2);
        assert!(policy
            .statements
            .iter()
            .all(|s| s.source_ip == "203.0.113.7/32"));
    }

    #[tokio::test]
    async fn test_default_policy_falls_back_to_open_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeDomains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DescribeDomainsResponse": {
                    "DescribeDomainsResult": {"DomainStatusList": [domain_status_json("lift")]}
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let policy = client
            .default_service_access_policy("lift")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(policy.statements[0].source_ip, "0.0.0.0/0");
    }

    #[tokio::test]
    async fn test_default_policy_without_services() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeDomains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DescribeDomainsResponse": {"DescribeDomainsResult": {"DomainStatusList": [
                    {"DomainName": "lift", "Created": false}
                ]}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client
            .default_service_access_policy("lift")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_default_policy_for_missing_domain() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeDomains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DescribeDomainsResponse": {"DescribeDomainsResult": {"DomainStatusList": []}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client
            .default_service_access_policy("lift")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_host_header_includes_non_default_port() {
        let url = Url::parse("http://LocalHost:8080/").unwrap();
        assert_eq!(host_header(&url).unwrap(), "localhost:8080");

        let url = Url::parse("https://cloudsearch.us-east-1.amazonaws.com").unwrap();
        assert_eq!(
            host_header(&url).unwrap(),
            "cloudsearch.us-east-1.amazonaws.com"
        );
    }
}
