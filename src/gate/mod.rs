//! Authorization Gate
//!
//! Runs ahead of every route handler. Requests under an exempt prefix pass
//! straight through; everything else is described as a [`DecisionInput`] and
//! sent to the [`DecisionClient`], whose verdict decides whether the handler
//! runs at all.

use crate::authz::{AuthzError, DecisionClient, DecisionInput};
use crate::config::{ConfigError, Settings, DEFAULT_EXEMPT_PATH};
use crate::metrics;
use crate::router::decoded_path;
use hyper::header::HeaderName;
use hyper::http::request::Parts;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Gate outcome for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Path is exempt, no decision was requested
    Exempt,
    /// Decision engine allowed the request
    Allow,
    /// Decision engine denied the request
    Deny,
}

impl Verdict {
    fn as_str(self) -> &'static str {
        match self {
            Verdict::Exempt => "exempt",
            Verdict::Allow => "allow",
            Verdict::Deny => "deny",
        }
    }
}

/// Authorization gate
pub struct AuthorizationGate {
    client: Arc<dyn DecisionClient>,
    exempt_paths: Vec<String>,
    roles_header: HeaderName,
}

impl AuthorizationGate {
    /// Gate with the default exempt prefix (`/health`) and roles header (`USER_ROLES`)
    pub fn new(client: Arc<dyn DecisionClient>) -> Self {
        Self {
            client,
            exempt_paths: vec![DEFAULT_EXEMPT_PATH.to_string()],
            // `USER_ROLES`, normalised
            roles_header: HeaderName::from_static("user_roles"),
        }
    }

    /// Gate configured from `settings`
    pub fn from_settings(
        client: Arc<dyn DecisionClient>,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(client)
            .with_exempt_paths(settings.exempt_paths.clone())
            .with_roles_header(settings.roles_header_name()?))
    }

    /// Replace the exempt path prefixes
    pub fn with_exempt_paths(mut self, prefixes: Vec<String>) -> Self {
        self.exempt_paths = prefixes;
        self
    }

    /// Replace the roles header
    pub fn with_roles_header(mut self, name: HeaderName) -> Self {
        self.roles_header = name;
        self
    }

    /// Plain prefix match, so `/healthz` is exempt under `/health`
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Describe a request for the decision engine
    pub fn decision_input(&self, parts: &Parts) -> DecisionInput {
        let path = decoded_path(parts.uri.path());
        self.describe(parts, &path)
    }

    fn describe(&self, parts: &Parts, path: &str) -> DecisionInput {
        // Header bytes are read as latin-1
        let roles = parts
            .headers
            .get(&self.roles_header)
            .map(|value| value.as_bytes().iter().map(|&b| b as char).collect::<String>());
        DecisionInput::new(path, roles.as_deref(), parts.method.as_str())
    }

    /// Decide whether the request may reach its handler
    pub async fn check(&self, parts: &Parts) -> Result<Verdict, AuthzError> {
        let path = decoded_path(parts.uri.path());
        if self.is_exempt(&path) {
            debug!(path = %path, "Exempt from authorization");
            metrics::record_decision(Verdict::Exempt.as_str());
            return Ok(Verdict::Exempt);
        }

        let input = self.describe(parts, &path);
        let started = Instant::now();
        let result = self.client.check_permission(&input).await;
        metrics::record_decision_duration(started.elapsed().as_secs_f64());

        let verdict = match result {
            Ok(true) => Verdict::Allow,
            Ok(false) => {
                info!(
                    method = %input.method,
                    path = %path,
                    roles = ?input.roles,
                    "Request denied by policy"
                );
                Verdict::Deny
            }
            Err(e) => {
                error!(method = %input.method, path = %path, "Authorization check failed: {}", e);
                metrics::record_decision("error");
                return Err(e);
            }
        };

        metrics::record_decision(verdict.as_str());
        Ok(verdict)
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("exempt_paths", &self.exempt_paths)
            .field("roles_header", &self.roles_header)
            .finish_non_exhaustive()
    }
}
