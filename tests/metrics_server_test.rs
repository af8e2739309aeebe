//! Metrics Server Integration Tests
//!
//! Tests for the Prometheus scrape endpoint.

use policy_gate::metrics::server::{MetricsServer, MetricsServerConfig};
use std::time::Duration;

fn local_config() -> MetricsServerConfig {
    MetricsServerConfig {
        address: "127.0.0.1:0".to_string(), // Use port 0 for random available port
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_endpoint_returns_prometheus_format() {
        policy_gate::metrics::record_decision("allow");

        let mut server = MetricsServer::new(local_config());
        let addr = server.start().await.expect("Server should start");

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/metrics", addr))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .expect("Should connect to metrics server");

        assert!(response.status().is_success());

        let content_type = response
            .headers()
            .get("content-type")
            .expect("Should have content-type")
            .to_str()
            .unwrap()
            .to_string();
        assert!(
            content_type.contains("text/plain"),
            "Content-Type should be Prometheus text format"
        );

        let body = response.text().await.unwrap();
        assert!(
            body.contains("policy_gate_decisions_total"),
            "Should contain gate decision counter"
        );

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let mut server = MetricsServer::new(local_config());
        let addr = server.start().await.expect("Server should start");

        let response = reqwest::get(format!("http://{}/health", addr))
            .await
            .expect("Should get health");

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), r#"{"status":"ok"}"#);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_path_returns_404() {
        let mut server = MetricsServer::new(local_config());
        let addr = server.start().await.expect("Server should start");

        let response = reqwest::get(format!("http://{}/unknown", addr))
            .await
            .expect("Should get response");

        assert_eq!(response.status(), 404);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let mut server = MetricsServer::new(local_config());
        let addr = server.start().await.expect("Server should start");
        server.shutdown().await;

        let result = reqwest::Client::new()
            .get(format!("http://{}/metrics", addr))
            .timeout(Duration::from_millis(500))
            .send()
            .await;

        assert!(result.is_err(), "Server should be stopped");
    }
}
