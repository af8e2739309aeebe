//! OPA (Open Policy Agent) decision client
//!
//! Posts a [`DecisionInput`] to an OPA data endpoint and reads the verdict
//! from `result.allow`.
//!
//! # Example
//!
//! ```no_run
//! use policy_gate::authz::opa::OpaClient;
//! use std::time::Duration;
//!
//! let client = OpaClient::builder()
//!     .url("http://localhost:8181/v1/data/sample")
//!     .timeout(Duration::from_secs(5))
//!     .build()
//!     .expect("valid config");
//! ```

use super::{AuthzError, DecisionClient, DecisionInput};
use crate::config::Settings;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default timeout for OPA requests (5 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// OPA client configuration
#[derive(Debug, Clone)]
pub struct OpaConfig {
    /// Full decision endpoint URL (e.g., "http://localhost:8181/v1/data/sample")
    pub url: String,
    /// Request timeout (default: 5 seconds)
    pub timeout: Option<Duration>,
}

/// OPA decision client
pub struct OpaClient {
    config: OpaConfig,
    client: reqwest::Client,
}

/// Builder for OpaClient
#[derive(Default)]
pub struct OpaClientBuilder {
    url: Option<String>,
    timeout: Option<Duration>,
}

/// OPA request body
#[derive(Debug, Serialize)]
struct OpaRequest<'a> {
    input: &'a DecisionInput,
}

impl OpaClientBuilder {
    /// Set the decision endpoint URL
    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the OpaClient
    pub fn build(self) -> Result<OpaClient, AuthzError> {
        let url = self
            .url
            .ok_or_else(|| AuthzError::Config("OPA URL is required".into()))?;

        OpaClient::new(OpaConfig {
            url,
            timeout: self.timeout,
        })
    }
}

impl OpaClient {
    /// Create a new OPA client
    pub fn new(config: OpaConfig) -> Result<Self, AuthzError> {
        let timeout = config.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthzError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create a client for the endpoint and timeout in `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self, AuthzError> {
        Self::builder()
            .url(&settings.opa_server_url)
            .timeout(settings.decision_timeout())
            .build()
    }

    /// Create a new builder for OpaClient
    pub fn builder() -> OpaClientBuilder {
        OpaClientBuilder::default()
    }

    /// The decision endpoint this client posts to
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

/// Read `result.allow`; anything but a JSON boolean counts as a denial.
fn extract_allow(body: &Value) -> bool {
    body.get("result")
        .and_then(|result| result.get("allow"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[async_trait]
impl DecisionClient for OpaClient {
    async fn check_permission(&self, input: &DecisionInput) -> Result<bool, AuthzError> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&OpaRequest { input })
            .send()
            .await
            .map_err(|e| AuthzError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthzError::Backend(format!(
                "OPA returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AuthzError::Backend(e.to_string()))?;

        let allowed = extract_allow(&body);

        debug!(
            method = %input.method,
            decision = %if allowed { "allow" } else { "deny" },
            "OPA authorization decision"
        );

        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_allow_true() {
        assert!(extract_allow(&json!({"result": {"allow": true}})));
    }

    #[test]
    fn test_extract_allow_false() {
        assert!(!extract_allow(&json!({"result": {"allow": false}})));
    }

    #[test]
    fn test_extract_allow_missing_fields() {
        assert!(!extract_allow(&json!({})));
        assert!(!extract_allow(&json!({"result": {}})));
        assert!(!extract_allow(&json!({"result": null})));
        assert!(!extract_allow(&json!([])));
    }

    #[test]
    fn test_extract_allow_requires_boolean() {
        assert!(!extract_allow(&json!({"result": {"allow": "true"}})));
        assert!(!extract_allow(&json!({"result": {"allow": 1}})));
        assert!(!extract_allow(&json!({"result": true})));
    }

    #[test]
    fn test_request_body_shape() {
        let input = DecisionInput::new("/v1/admin", None, "GET");
        let body = serde_json::to_value(OpaRequest { input: &input }).unwrap();
        assert_eq!(
            body,
            json!({"input": {"path": ["", "v1", "admin"], "roles": [], "method": "GET"}})
        );
    }

    #[test]
    fn test_builder_pattern() {
        let client = OpaClient::builder()
            .url("http://localhost:8181/v1/data/sample")
            .timeout(Duration::from_secs(5))
            .build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_builder_missing_url() {
        let result = OpaClient::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings::default();
        let client = OpaClient::from_settings(&settings).unwrap();
        assert_eq!(client.url(), settings.opa_server_url);
    }
}
