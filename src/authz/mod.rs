//! Authorization module
//!
//! Defines the decision-engine boundary: the per-request [`DecisionInput`]
//! and the [`DecisionClient`] trait. The OPA implementation lives in [`opa`].

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod opa;

/// Authorization errors
#[derive(Error, Debug)]
pub enum AuthzError {
    /// The decision could not be obtained (transport, status, or body error)
    #[error("Decision engine error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Request attributes submitted to the decision engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionInput {
    /// Request path split on `/`, including the leading empty segment
    pub path: Vec<String>,
    /// Caller-asserted roles
    pub roles: Vec<String>,
    /// HTTP method as received
    pub method: String,
}

impl DecisionInput {
    /// Build an input from raw request attributes.
    ///
    /// `roles_header` is split on `,` without trimming; an absent or empty
    /// header yields no roles.
    pub fn new(path: &str, roles_header: Option<&str>, method: &str) -> Self {
        Self {
            path: split_path(path),
            roles: split_roles(roles_header),
            method: method.to_string(),
        }
    }
}

/// `"/v1/admin"` becomes `["", "v1", "admin"]`
fn split_path(path: &str) -> Vec<String> {
    path.split('/').map(str::to_string).collect()
}

fn split_roles(header: Option<&str>) -> Vec<String> {
    match header {
        Some(value) if !value.is_empty() => value.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Decision client trait
///
/// `Ok(false)` is a denial; `Err` means no decision could be obtained and the
/// caller must not treat it as an allow.
#[async_trait]
pub trait DecisionClient: Send + Sync {
    /// Ask the decision engine whether `input` is allowed
    async fn check_permission(&self, input: &DecisionInput) -> Result<bool, AuthzError>;
}

/// Decision client that always allows
pub struct AllowAll;

#[async_trait]
impl DecisionClient for AllowAll {
    async fn check_permission(&self, _input: &DecisionInput) -> Result<bool, AuthzError> {
        Ok(true)
    }
}

/// Decision client that always denies
pub struct DenyAll;

#[async_trait]
impl DecisionClient for DenyAll {
    async fn check_permission(&self, _input: &DecisionInput) -> Result<bool, AuthzError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_input() -> DecisionInput {
        DecisionInput::new("/v1/admin/users/alice", Some("ADMIN_ROLE"), "POST")
    }

    #[test]
    fn test_path_keeps_leading_empty_segment() {
        let input = test_input();
        assert_eq!(input.path, vec!["", "v1", "admin", "users", "alice"]);
    }

    #[test]
    fn test_root_path() {
        let input = DecisionInput::new("/", None, "GET");
        assert_eq!(input.path, vec!["", ""]);
    }

    #[test]
    fn test_roles_split_without_trimming() {
        let input = DecisionInput::new("/", Some("ADMIN_ROLE, USER_ROLE"), "GET");
        assert_eq!(input.roles, vec!["ADMIN_ROLE", " USER_ROLE"]);
    }

    #[test]
    fn test_absent_or_empty_roles() {
        assert!(DecisionInput::new("/", None, "GET").roles.is_empty());
        assert!(DecisionInput::new("/", Some(""), "GET").roles.is_empty());
    }

    #[test]
    fn test_method_is_verbatim() {
        assert_eq!(test_input().method, "POST");
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(test_input()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "path": ["", "v1", "admin", "users", "alice"],
                "roles": ["ADMIN_ROLE"],
                "method": "POST"
            })
        );
    }

    #[tokio::test]
    async fn test_allow_all() {
        let client = AllowAll;
        let result = client.check_permission(&test_input()).await.unwrap();
        assert!(result);
    }

    #[tokio::test]
    async fn test_deny_all() {
        let client = DenyAll;
        let result = client.check_permission(&test_input()).await.unwrap();
        assert!(!result);
    }
}
