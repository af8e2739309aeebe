//! Gated request service
//!
//! Composes the [`AuthorizationGate`] with a [`Handler`]: the gate runs first
//! and the handler only sees requests it let through.

use crate::gate::{AuthorizationGate, Verdict};
use crate::metrics;
use crate::router::response::{self, Body};
use crate::router::Handler;
use hyper::{Request, Response};
use std::time::Instant;
use tracing::info;

/// Gate in front of a handler
#[derive(Debug)]
pub struct GatedService<H> {
    gate: AuthorizationGate,
    handler: H,
}

impl<H: Handler> GatedService<H> {
    /// Wrap `handler` behind `gate`
    pub fn new(gate: AuthorizationGate, handler: H) -> Self {
        Self { gate, handler }
    }

    /// Serve one request
    ///
    /// The request body is never read. A denial yields 401 and a failed
    /// decision yields 500; in both cases the handler does not run.
    pub async fn call<B>(&self, req: Request<B>) -> Response<Body> {
        let started = Instant::now();
        let (parts, _) = req.into_parts();

        let response = match self.gate.check(&parts).await {
            Ok(Verdict::Deny) => response::unauthorized(),
            Ok(_) => self.handler.handle(&parts),
            Err(_) => response::internal_error(),
        };

        let status = response.status().as_u16();
        metrics::record_request(parts.method.as_str(), status);
        info!(
            method = %parts.method,
            path = %parts.uri.path(),
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Handled request"
        );

        response
    }
}
