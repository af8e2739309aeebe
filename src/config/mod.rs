//! Configuration module for Policy Gate
//!
//! Settings are read once at startup from built-in defaults, an optional
//! configuration file and the process environment (`OPA_SERVER_URL`,
//! `APP_NAME`, `DEBUG`, `HOST`, `PORT`; the rest under `POLICY_GATE_`). The resulting [`Settings`] value
//! is immutable and handed explicitly to the components that need it.

use hyper::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::{SettingsLoader, ENV_PREFIX};

// ============================================================================
// Defaults
// ============================================================================

/// Default decision endpoint of a local OPA sidecar
pub const DEFAULT_OPA_SERVER_URL: &str = "http://localhost:8181/v1/data/sample";

/// Header carrying the comma-separated caller roles
pub const DEFAULT_ROLES_HEADER: &str = "USER_ROLES";

/// Path prefix exempt from the authorization check
pub const DEFAULT_EXEMPT_PATH: &str = "/health";

fn default_opa_server_url() -> String {
    DEFAULT_OPA_SERVER_URL.to_string()
}

fn default_app_name() -> String {
    "policy-gate".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_decision_timeout_secs() -> u64 {
    5
}

fn default_exempt_paths() -> Vec<String> {
    vec![DEFAULT_EXEMPT_PATH.to_string()]
}

fn default_roles_header() -> String {
    DEFAULT_ROLES_HEADER.to_string()
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Process-wide service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Full URL of the decision endpoint, e.g. `http://localhost:8181/v1/data/sample`
    #[serde(default = "default_opa_server_url")]
    pub opa_server_url: String,

    /// Display name used in logs
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Verbose logging when no explicit log level is given
    #[serde(default)]
    pub debug: bool,

    /// Bind host (IP address or resolvable name)
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port, 0 lets the OS pick one
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for a single decision call
    #[serde(default = "default_decision_timeout_secs")]
    pub decision_timeout_secs: u64,

    /// Path prefixes that bypass the authorization check
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,

    /// Request header holding the caller roles
    #[serde(default = "default_roles_header")]
    pub roles_header: String,

    /// Port of the Prometheus scrape endpoint (disabled when unset)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opa_server_url: default_opa_server_url(),
            app_name: default_app_name(),
            debug: false,
            host: default_host(),
            port: default_port(),
            decision_timeout_secs: default_decision_timeout_secs(),
            exempt_paths: default_exempt_paths(),
            roles_header: default_roles_header(),
            metrics_port: None,
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let loader = SettingsLoader::new();
        match path {
            Some(path) => loader.file(path).load(),
            None => loader.load(),
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.opa_server_url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid OPA server URL '{}': must start with http:// or https://",
                self.opa_server_url
            )));
        }

        if self.app_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Application name cannot be empty".into(),
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("Bind host cannot be empty".into()));
        }

        if self.decision_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Decision timeout must be greater than zero".into(),
            ));
        }

        for prefix in &self.exempt_paths {
            if !prefix.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "Exempt path '{}' must start with /",
                    prefix
                )));
            }
        }

        self.roles_header_name()?;

        Ok(())
    }

    /// Timeout applied to each decision call
    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }

    /// Parsed roles header name (header names are case-insensitive)
    pub fn roles_header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::from_bytes(self.roles_header.as_bytes()).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Invalid roles header '{}': {}",
                self.roles_header, e
            ))
        })
    }

    /// `host:port` string suitable for binding, with IPv6 literals bracketed
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
