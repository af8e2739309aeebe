//! Prometheus Metrics HTTP Server
//!
//! Serves `GET /metrics` on a port separate from the gated listener, so
//! scrapes never reach the authorization gate.
//!
//! # Example
//!
//! ```no_run
//! use policy_gate::metrics::server::{MetricsServer, MetricsServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MetricsServerConfig {
//!         address: "127.0.0.1:9090".to_string(),
//!     };
//!     let mut server = MetricsServer::new(config);
//!     let addr = server.start().await?;
//!     println!("Metrics server listening on {}", addr);
//!     Ok(())
//! }
//! ```

use crate::config::Settings;
use crate::router::response::{self, Body};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, TextEncoder};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Configuration for the metrics server
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind to (e.g., "127.0.0.1:9090")
    pub address: String,
}

impl MetricsServerConfig {
    /// Metrics address on the service host, or `None` when disabled
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        settings.metrics_port.map(|port| {
            let service = Settings {
                port,
                ..settings.clone()
            };
            Self {
                address: service.bind_address(),
            }
        })
    }
}

/// Metrics server error
#[derive(Debug, thiserror::Error)]
pub enum MetricsServerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Prometheus metrics HTTP server
pub struct MetricsServer {
    config: MetricsServerConfig,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MetricsServer {
    /// Create a new metrics server
    pub fn new(config: MetricsServerConfig) -> Self {
        Self {
            config,
            shutdown_tx: None,
            server_handle: None,
        }
    }

    /// Start the metrics server
    ///
    /// Returns the actual bound address (useful when using port 0)
    pub async fn start(&mut self) -> Result<SocketAddr, MetricsServerError> {
        let listener = TcpListener::bind(&self.config.address).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            run_server(listener, shutdown_rx).await;
        });

        self.server_handle = Some(handle);

        Ok(addr)
    }

    /// Shutdown the metrics server
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }
}

/// Run the HTTP server loop
async fn run_server(listener: TcpListener, mut shutdown_rx: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        tokio::spawn(async move {
                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service_fn(handle_request))
                                .await
                            {
                                debug!("Metrics connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        warn!("Failed to accept metrics connection: {}", e);
                        continue;
                    }
                }
            }
        }
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => metrics_handler(),
        (&Method::GET, "/health") => response::json(StatusCode::OK, r#"{"status":"ok"}"#),
        _ => response::text(StatusCode::NOT_FOUND, "Not Found"),
    };
    Ok(response)
}

/// Handle /metrics endpoint
fn metrics_handler() -> Response<Body> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return response::text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics");
    }

    response::with_content_type(StatusCode::OK, encoder.format_type(), buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_disabled_by_default() {
        let settings = Settings::default();
        assert!(MetricsServerConfig::from_settings(&settings).is_none());
    }

    #[test]
    fn test_config_uses_service_host() {
        let settings = Settings {
            host: "127.0.0.1".into(),
            metrics_port: Some(9090),
            ..Settings::default()
        };
        let config = MetricsServerConfig::from_settings(&settings).unwrap();
        assert_eq!(config.address, "127.0.0.1:9090");
    }

    #[test]
    fn test_metrics_handler_returns_text_format() {
        crate::metrics::record_decision("allow");
        let response = metrics_handler();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }
}
