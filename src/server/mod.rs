//! HTTP server module
//!
//! Accepts connections with hyper on tokio and serves every request through
//! a [`GatedService`].
//!
//! # Example
//!
//! ```no_run
//! use policy_gate::{config::Settings, server::Server};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let server = Server::new(&settings).await?;
//! println!("Listening on {}", server.local_addr());
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

mod service;

pub use service::GatedService;

use crate::authz::opa::OpaClient;
use crate::config::Settings;
use crate::gate::AuthorizationGate;
use crate::router::{AdminRoutes, Handler};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Incoming, Request};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("Setup error: {0}")]
    SetupError(String),
}

/// HTTP Server
pub struct Server<H = AdminRoutes> {
    app_name: String,
    service: Arc<GatedService<H>>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server<AdminRoutes> {
    /// Bind the service's routes behind an OPA-backed gate
    pub async fn new(settings: &Settings) -> Result<Self, ServerError> {
        let client = OpaClient::from_settings(settings)
            .map_err(|e| ServerError::SetupError(e.to_string()))?;
        let gate = AuthorizationGate::from_settings(Arc::new(client), settings)
            .map_err(|e| ServerError::SetupError(e.to_string()))?;

        Self::bind(settings, GatedService::new(gate, AdminRoutes)).await
    }
}

impl<H: Handler> Server<H> {
    /// Bind `service` to the configured host and port
    ///
    /// Port 0 lets the OS pick a port; see [`Server::local_addr`].
    pub async fn bind(settings: &Settings, service: GatedService<H>) -> Result<Self, ServerError> {
        let address = settings.bind_address();
        let listener = TcpListener::bind(address.as_str())
            .await
            .map_err(|e| ServerError::BindError(format!("{}: {}", address, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(format!("Failed to get local address: {}", e)))?;

        Ok(Self {
            app_name: settings.app_name.clone(),
            service: Arc::new(service),
            listener,
            local_addr,
        })
    }

    /// The address the server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Run until `shutdown` completes
    ///
    /// Each connection is served on its own task. Accept errors are logged
    /// and do not stop the server.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        info!("{} listening on {}", self.app_name, self.local_addr);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            let service = Arc::clone(&self.service);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let svc = service_fn(move |req: Request<Incoming>| {
                    let service = Arc::clone(&service);
                    async move { Ok::<_, Infallible>(service.call(req).await) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                    debug!("Error serving connection from {}: {}", peer_addr, e);
                }
            });
        }

        info!("Shutting down {}", self.app_name);
        Ok(())
    }
}
