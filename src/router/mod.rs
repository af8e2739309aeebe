//! Route Handlers
//!
//! Resolves a method and path to one of the service routes and renders its
//! response. Handlers are pure: they see only the request head and keep no
//! state between requests.
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/v1/admin/users/{userName}` | 200 plain text |
//! | POST | `/v1/admin/users/{userName}` | 200 plain text |
//! | GET | `/health/liveness` | 200 `{"status":"alive"}` |
//! | GET | `/health/readiness` | 200 `{"status":"ready"}` |

pub mod response;

use hyper::header::{HeaderValue, ALLOW};
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use percent_encoding::percent_decode_str;
use response::Body;
use serde_json::json;
use std::borrow::Cow;

/// Prefix of the admin user routes
const USERS_PREFIX: &str = "/v1/admin/users/";

/// Resolved route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// GET /v1/admin/users/{userName}
    GetUser { user_name: String },
    /// POST /v1/admin/users/{userName}
    UpdateUser { user_name: String },
    /// GET /health/liveness
    Liveness,
    /// GET /health/readiness
    Readiness,
    /// Known path, unsupported method
    MethodNotAllowed { allow: &'static str },
    /// Unknown path
    NotFound,
}

/// Percent-decode a request path; invalid UTF-8 is replaced lossily.
pub fn decoded_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

impl Route {
    /// Resolve a (decoded) path and method to a route
    pub fn resolve(method: &Method, path: &str) -> Route {
        if let Some(user_name) = path.strip_prefix(USERS_PREFIX) {
            if user_name.is_empty() || user_name.contains('/') {
                return Route::NotFound;
            }
            let user_name = user_name.to_string();
            return if method == Method::GET {
                Route::GetUser { user_name }
            } else if method == Method::POST {
                Route::UpdateUser { user_name }
            } else {
                Route::MethodNotAllowed {
                    allow: "GET, POST",
                }
            };
        }

        let health = match path {
            "/health/liveness" => Route::Liveness,
            "/health/readiness" => Route::Readiness,
            _ => return Route::NotFound,
        };

        if method == Method::GET {
            health
        } else {
            Route::MethodNotAllowed { allow: "GET" }
        }
    }

    /// Render the route's response
    pub fn respond(&self) -> Response<Body> {
        match self {
            Route::GetUser { user_name } => response::text(
                StatusCode::OK,
                format!("Hello!! {} You have reached the Get Users", user_name),
            ),
            Route::UpdateUser { user_name } => response::text(
                StatusCode::OK,
                format!("Hello!! {} You have access to edits", user_name),
            ),
            Route::Liveness => response::json_value(StatusCode::OK, &json!({"status": "alive"})),
            Route::Readiness => response::json_value(StatusCode::OK, &json!({"status": "ready"})),
            Route::MethodNotAllowed { allow } => {
                let mut response = response::json_value(
                    StatusCode::METHOD_NOT_ALLOWED,
                    &json!({"detail": "Method Not Allowed"}),
                );
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static(*allow));
                response
            }
            Route::NotFound => {
                response::json_value(StatusCode::NOT_FOUND, &json!({"detail": "Not Found"}))
            }
        }
    }
}

/// Request handler run after the authorization gate
pub trait Handler: Send + Sync + 'static {
    /// Produce a response for the request head
    fn handle(&self, parts: &Parts) -> Response<Body>;
}

/// The service's route table
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminRoutes;

impl Handler for AdminRoutes {
    fn handle(&self, parts: &Parts) -> Response<Body> {
        let path = decoded_path(parts.uri.path());
        Route::resolve(&parts.method, &path).respond()
    }
}
