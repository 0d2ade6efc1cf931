//! Upstream failure flows: retries, circuit opening, recovery through the
//! half-open probe window, and SERVFAIL when everything is down.

#[path = "../common/mod.rs"]
mod common;

use common::mock_upstream::{MockUpstream, UpstreamBehavior};
use common::{config_with_upstream, TestResolver};
use hickory_proto::op::ResponseCode;
use std::net::Ipv4Addr;
use std::time::Duration;
use warden_dns_domain::{RecordType, Stage, TraceAction};
use warden_dns_infrastructure::dns::BreakerState;

#[tokio::test]
async fn breaker_opens_after_failures_and_recovers() {
    let flaky = MockUpstream::start(UpstreamBehavior::silent()).await.unwrap();
    let steady =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(192, 0, 2, 20), 60))
            .await
            .unwrap();

    let mut config = config_with_upstream(&flaky);
    config.dns.upstreams = vec![flaky.addr_string(), steady.addr_string()];
    config.dns.query_timeout_ms = 100;
    config.dns.retries = 2;
    config.cache.enabled = false;
    config.circuit_breaker.failure_threshold = 5;
    config.circuit_breaker.success_threshold = 2;
    config.circuit_breaker.open_timeout_ms = 300;

    let resolver = TestResolver::start(config).await;

    // Round-robin lands on the flaky upstream once per query; after five
    // failures its breaker opens. Clients keep getting answers via the
    // steady upstream the whole time.
    for i in 0..5 {
        let outcome = resolver.query(&format!("q{}.test", i), RecordType::A).await;
        assert_eq!(
            outcome.response.as_ref().unwrap().response_code(),
            ResponseCode::NoError
        );
    }
    assert_eq!(
        resolver.pool.upstreams()[0].breaker.state(),
        BreakerState::Open
    );

    // While open, only the steady upstream is contacted.
    let flaky_tried = flaky.query_count();
    for i in 0..4 {
        resolver.query(&format!("open{}.test", i), RecordType::A).await;
    }
    assert_eq!(flaky.query_count(), flaky_tried);

    // Recovery: after open_timeout, probes reach the (now healthy)
    // upstream; success_threshold=2 closes the circuit.
    flaky.set_behavior(UpstreamBehavior::answering(Ipv4Addr::new(192, 0, 2, 21), 60));
    tokio::time::sleep(Duration::from_millis(350)).await;

    let mut closed = false;
    for i in 0..8 {
        resolver.query(&format!("probe{}.test", i), RecordType::A).await;
        if resolver.pool.upstreams()[0].breaker.state() == BreakerState::Closed {
            closed = true;
            break;
        }
    }
    assert!(closed, "breaker should return to Closed after two probe successes");
}

#[tokio::test]
async fn total_upstream_outage_yields_servfail_with_trace() {
    let dead = MockUpstream::start(UpstreamBehavior::silent()).await.unwrap();
    let mut config = config_with_upstream(&dead);
    config.dns.query_timeout_ms = 100;
    config.dns.retries = 1;

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("dark.test", RecordType::A).await;

    assert_eq!(
        outcome.response.as_ref().unwrap().response_code(),
        ResponseCode::ServFail
    );
    let upstream_entry = outcome
        .trace
        .iter()
        .find(|e| e.stage == Stage::Upstream)
        .expect("upstream error entry");
    assert_eq!(upstream_entry.action, TraceAction::Error);
}

#[tokio::test]
async fn upstream_nxdomain_is_an_answer_not_a_failure() {
    let nx = MockUpstream::start(UpstreamBehavior::nxdomain()).await.unwrap();
    let healthy = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();

    let mut config = config_with_upstream(&nx);
    config.dns.upstreams = vec![nx.addr_string(), healthy.addr_string()];

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("nope.test", RecordType::A).await;

    assert_eq!(
        outcome.response.as_ref().unwrap().response_code(),
        ResponseCode::NXDomain
    );
    assert_eq!(healthy.query_count(), 0, "NXDOMAIN is returned verbatim, never retried");
    // And the breaker counts it as a success, not a failure.
    assert_eq!(
        resolver.pool.upstreams()[0].breaker.state(),
        BreakerState::Closed
    );
}
