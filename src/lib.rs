//! Policy Gate Library
//!
//! HTTP authorization gate that delegates allow/deny decisions to an
//! Open Policy Agent sidecar.
//!
//! # Features
//!
//! - **Delegated decisions**: every non-exempt request is described as
//!   `{"input": {"path", "roles", "method"}}` and posted to OPA
//! - **Fail closed**: malformed verdicts deny, unreachable engines yield 500
//! - **Health bypass**: `/health` prefixed paths skip the check
//! - **Prometheus metrics**: optional scrape endpoint on a separate port
//!
//! # Example
//!
//! ```no_run
//! use policy_gate::{config::Settings, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let server = Server::new(&settings).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod authz;
pub mod config;
pub mod gate;
pub mod metrics;
pub mod router;
pub mod server;

// Re-export commonly used types
pub use crate::config::Settings;
pub use crate::server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
