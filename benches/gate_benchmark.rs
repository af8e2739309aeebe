//! Gate benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hyper::{Method, Request};
use policy_gate::authz::{AllowAll, DecisionInput};
use policy_gate::gate::AuthorizationGate;
use std::sync::Arc;

fn benchmark_decision_input(c: &mut Criterion) {
    let gate = AuthorizationGate::new(Arc::new(AllowAll));
    let (parts, _) = Request::builder()
        .method(Method::POST)
        .uri("/v1/admin/users/testuser")
        .header("USER_ROLES", "ADMIN_ROLE,USER_ROLE,AUDITOR")
        .body(())
        .unwrap()
        .into_parts();

    c.bench_function("decision_input", |b| {
        b.iter(|| black_box(gate.decision_input(black_box(&parts))));
    });

    c.bench_function("decision_input_serialize", |b| {
        let input: DecisionInput = gate.decision_input(&parts);
        b.iter(|| black_box(serde_json::to_vec(black_box(&input)).unwrap()));
    });
}

fn benchmark_gate_check(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let gate = AuthorizationGate::new(Arc::new(AllowAll));
    let (parts, _) = Request::builder()
        .uri("/health/liveness")
        .body(())
        .unwrap()
        .into_parts();

    c.bench_function("gate_check_exempt", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(gate.check(&parts).await.unwrap()) });
    });
}

criterion_group!(benches, benchmark_decision_input, benchmark_gate_check);
criterion_main!(benches);
