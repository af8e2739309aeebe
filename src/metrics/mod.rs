//! Metrics module
//!
//! Prometheus counters for gate outcomes and served requests.

pub mod server;

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram, CounterVec, Histogram};

lazy_static! {
    // Gate metrics
    pub static ref DECISIONS_TOTAL: CounterVec = register_counter_vec!(
        "policy_gate_decisions_total",
        "Authorization gate outcomes",
        &["outcome"]  // "exempt", "allow", "deny" or "error"
    ).unwrap();

    pub static ref DECISION_DURATION: Histogram = register_histogram!(
        "policy_gate_decision_duration_seconds",
        "Decision engine round-trip in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]
    ).unwrap();

    // Request metrics
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "policy_gate_requests_total",
        "Requests served",
        &["method", "status"]
    ).unwrap();
}

/// Record a gate outcome
pub fn record_decision(outcome: &str) {
    DECISIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record decision engine latency
pub fn record_decision_duration(duration_secs: f64) {
    DECISION_DURATION.observe(duration_secs);
}

/// Record a served request
pub fn record_request(method: &str, status: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decision() {
        let before = DECISIONS_TOTAL.with_label_values(&["deny"]).get();
        record_decision("deny");
        assert!(DECISIONS_TOTAL.with_label_values(&["deny"]).get() >= before + 1.0);
    }

    #[test]
    fn test_record_decision_duration() {
        record_decision_duration(0.004);
        // Just verify it doesn't panic
    }

    #[test]
    fn test_record_request() {
        record_request("GET", 200);
        assert!(REQUESTS_TOTAL.with_label_values(&["GET", "200"]).get() >= 1.0);
    }
}
