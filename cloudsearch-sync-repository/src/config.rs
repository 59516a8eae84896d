//! Configuration types for the CloudSearch API clients.

use std::time::Duration;

/// Default configuration API endpoint.
pub const DEFAULT_CONFIG_ENDPOINT: &str = "https://cloudsearch.us-east-1.amazonaws.com";

/// Configuration API version.
pub const DEFAULT_API_VERSION: &str = "2011-02-01";

/// API version used for the search endpoint.
pub const DEFAULT_SEARCH_API_VERSION: &str = "2013-01-01";

/// Default signing region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Service name used in the credential scope.
pub const SERVICE_NAME: &str = "cloudsearch";

/// Default service used to discover the caller's egress IP.
pub const DEFAULT_EGRESS_IP_LOOKUP_URL: &str = "http://ifconfig.me/ip";

/// Configuration shared by the configuration API and document service clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Configuration API endpoint URL.
    pub config_endpoint: String,
    /// Version sent with configuration actions and used for the batch path.
    pub api_version: String,
    /// Version used in the search path.
    pub search_api_version: String,
    /// Region used in the credential scope.
    pub region: String,
    /// URL that answers with the caller's public IP as plain text.
    pub egress_ip_lookup_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            config_endpoint: DEFAULT_CONFIG_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            search_api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
            region: DEFAULT_REGION.to_string(),
            egress_ip_lookup_url: DEFAULT_EGRESS_IP_LOOKUP_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at a different configuration endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - The configuration API endpoint URL
    ///
    /// # Returns
    ///
    /// A `ClientConfig` with every other value defaulted.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            config_endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}
