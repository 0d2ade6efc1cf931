//! Conditional forwarding flows: rule-steered upstreams, matcher
//! restrictions, and failover back to the default pool.

#[path = "../common/mod.rs"]
mod common;

use common::mock_upstream::{MockUpstream, UpstreamBehavior};
use common::{config_with_upstream, first_a, request, TestResolver};
use std::net::Ipv4Addr;
use tokio_util::sync::CancellationToken;
use warden_dns_domain::config::ForwardRuleConfig;
use warden_dns_domain::{RecordType, Stage, TraceAction};

fn rule(name: &str, priority: i32, domains: Vec<String>, upstreams: Vec<String>) -> ForwardRuleConfig {
    ForwardRuleConfig {
        name: name.to_string(),
        priority,
        domains,
        client_cidrs: vec![],
        record_types: vec![],
        upstreams,
        timeout_ms: None,
        retries: None,
        failover: true,
        enabled: true,
    }
}

#[tokio::test]
async fn matching_rule_steers_to_its_upstreams() {
    let default_upstream =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(1, 1, 1, 1), 60))
            .await
            .unwrap();
    let corp = MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(10, 0, 0, 99), 60))
        .await
        .unwrap();

    let mut config = config_with_upstream(&default_upstream);
    config.conditional_forwarding.rules = vec![rule(
        "corp",
        90,
        vec!["*.corp".to_string()],
        vec![corp.addr_string()],
    )];

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("intranet.corp", RecordType::A).await;

    assert_eq!(first_a(&outcome), Some(Ipv4Addr::new(10, 0, 0, 99)));
    assert_eq!(corp.query_count(), 1);
    assert_eq!(default_upstream.query_count(), 0);

    let entry = outcome
        .trace
        .iter()
        .find(|e| e.stage == Stage::ConditionalForward)
        .expect("conditional-forward entry");
    assert_eq!(entry.action, TraceAction::Forward);
    assert_eq!(entry.rule.as_deref(), Some("corp"));
}

#[tokio::test]
async fn non_matching_queries_use_the_default_pool() {
    let default_upstream =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(1, 1, 1, 1), 60))
            .await
            .unwrap();
    let corp = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();

    let mut config = config_with_upstream(&default_upstream);
    config.conditional_forwarding.rules = vec![rule(
        "corp",
        90,
        vec!["*.corp".to_string()],
        vec![corp.addr_string()],
    )];

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("www.example.com", RecordType::A).await;

    assert_eq!(first_a(&outcome), Some(Ipv4Addr::new(1, 1, 1, 1)));
    assert_eq!(corp.query_count(), 0);
    assert_eq!(default_upstream.query_count(), 1);
}

#[tokio::test]
async fn dead_rule_upstream_fails_over_to_default_pool() {
    let default_upstream =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(1, 1, 1, 1), 60))
            .await
            .unwrap();
    let dead = MockUpstream::start(UpstreamBehavior::silent()).await.unwrap();

    let mut config = config_with_upstream(&default_upstream);
    config.dns.query_timeout_ms = 100;
    config.conditional_forwarding.rules = vec![rule(
        "corp",
        90,
        vec!["*.corp".to_string()],
        vec![dead.addr_string()],
    )];

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("files.corp", RecordType::A).await;

    assert_eq!(first_a(&outcome), Some(Ipv4Addr::new(1, 1, 1, 1)));
    assert_eq!(dead.query_count(), 1);
    assert_eq!(default_upstream.query_count(), 1);
}

#[tokio::test]
async fn rule_without_failover_surfaces_servfail() {
    let default_upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let dead = MockUpstream::start(UpstreamBehavior::silent()).await.unwrap();

    let mut config = config_with_upstream(&default_upstream);
    config.dns.query_timeout_ms = 100;
    let mut no_failover = rule(
        "corp",
        90,
        vec!["*.corp".to_string()],
        vec![dead.addr_string()],
    );
    no_failover.failover = false;
    config.conditional_forwarding.rules = vec![no_failover];

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("files.corp", RecordType::A).await;

    assert_eq!(
        outcome.response.as_ref().unwrap().response_code(),
        hickory_proto::op::ResponseCode::ServFail
    );
    assert_eq!(default_upstream.query_count(), 0);
}

#[tokio::test]
async fn client_cidr_restricts_rule_to_matching_networks() {
    let default_upstream =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(1, 1, 1, 1), 60))
            .await
            .unwrap();
    let lan = MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(10, 0, 0, 53), 60))
        .await
        .unwrap();

    let mut config = config_with_upstream(&default_upstream);
    config.cache.enabled = false;
    let mut lan_rule = rule(
        "lan-only",
        50,
        vec!["*.corp".to_string()],
        vec![lan.addr_string()],
    );
    lan_rule.client_cidrs = vec!["10.0.0.0/8".to_string()];
    config.conditional_forwarding.rules = vec![lan_rule];

    let resolver = TestResolver::start(config).await;

    // Default test client is 10.0.0.5 → inside the CIDR.
    let inside = resolver.query("portal.corp", RecordType::A).await;
    assert_eq!(first_a(&inside), Some(Ipv4Addr::new(10, 0, 0, 53)));

    // A client outside the network falls through to the default pool.
    let mut outside_request = request("portal.corp", RecordType::A);
    outside_request.client.ip = "192.168.7.7".parse().unwrap();
    let outside = resolver
        .pipeline
        .handle(outside_request, CancellationToken::new())
        .await;
    assert_eq!(first_a(&outside), Some(Ipv4Addr::new(1, 1, 1, 1)));
}
