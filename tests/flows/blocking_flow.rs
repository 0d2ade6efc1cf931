//! Blocking flows: direct blocks in every block mode, whitelist overrides,
//! and kill-switch suspensions.

#[path = "../common/mod.rs"]
mod common;

use common::mock_upstream::{MockUpstream, UpstreamBehavior};
use common::{config_with_upstream, first_a, has_stage, TestResolver};
use hickory_proto::op::ResponseCode;
use std::net::Ipv4Addr;
use warden_dns_domain::config::BlockMode;
use warden_dns_domain::{RecordType, Stage, TraceAction};

#[tokio::test]
async fn zero_ip_block_flow() {
    let upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let mut config = config_with_upstream(&upstream);
    config.blocking.custom_blocked = vec!["ads.example.com".to_string()];
    config.cache.blocked_ttl = 300;

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("ads.example.com", RecordType::A).await;

    let response = outcome.response.as_ref().unwrap();
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert_eq!(first_a(&outcome), Some(Ipv4Addr::UNSPECIFIED));
    assert_eq!(response.answers()[0].ttl(), 300);
    assert_eq!(upstream.query_count(), 0);

    let entry = outcome
        .trace
        .iter()
        .find(|e| e.stage == Stage::Blocklist)
        .expect("blocklist entry");
    assert_eq!(entry.action, TraceAction::Block);
    assert_eq!(entry.rule.as_deref(), Some("ads.example.com"));
}

#[tokio::test]
async fn aaaa_zero_ip_block_returns_unspecified_v6() {
    let upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let mut config = config_with_upstream(&upstream);
    config.blocking.custom_blocked = vec!["ads.example.com".to_string()];

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("ads.example.com", RecordType::Aaaa).await;

    let response = outcome.response.as_ref().unwrap();
    let has_v6_zero = response.answers().iter().any(|r| {
        matches!(r.data(), hickory_proto::rr::RData::AAAA(aaaa) if aaaa.0.is_unspecified())
    });
    assert!(has_v6_zero, "AAAA block answers ::");
}

#[tokio::test]
async fn nxdomain_block_mode() {
    let upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let mut config = config_with_upstream(&upstream);
    config.blocking.custom_blocked = vec!["ads.example.com".to_string()];
    config.blocking.block_mode = BlockMode::Nxdomain;

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("ads.example.com", RecordType::A).await;

    let response = outcome.response.as_ref().unwrap();
    assert_eq!(response.response_code(), ResponseCode::NXDomain);
    assert!(response.answers().is_empty());
}

#[tokio::test]
async fn refused_block_mode() {
    let upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let mut config = config_with_upstream(&upstream);
    config.blocking.custom_blocked = vec!["ads.example.com".to_string()];
    config.blocking.block_mode = BlockMode::Refused;

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("ads.example.com", RecordType::A).await;

    assert_eq!(
        outcome.response.as_ref().unwrap().response_code(),
        ResponseCode::Refused
    );
}

#[tokio::test]
async fn whitelist_wins_over_blocklist() {
    let upstream =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(93, 184, 216, 34), 120))
            .await
            .unwrap();
    let mut config = config_with_upstream(&upstream);
    config.blocking.custom_blocked = vec!["ads.example.com".to_string()];
    config.whitelist = vec!["*.example.com".to_string()];

    let resolver = TestResolver::start(config).await;
    let outcome = resolver.query("ads.example.com", RecordType::A).await;

    assert_eq!(first_a(&outcome), Some(Ipv4Addr::new(93, 184, 216, 34)));
    assert!(has_stage(&outcome, Stage::Whitelist));
    assert!(has_stage(&outcome, Stage::Upstream));
    assert!(!has_stage(&outcome, Stage::Blocklist));
    assert_eq!(upstream.query_count(), 1);
}

#[tokio::test]
async fn kill_switch_suspends_blocking_until_expiry() {
    let upstream =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(192, 0, 2, 1), 60))
            .await
            .unwrap();
    let mut config = config_with_upstream(&upstream);
    config.blocking.custom_blocked = vec!["ads.example.com".to_string()];
    config.cache.enabled = false;

    let resolver = TestResolver::start(config).await;

    // Suspended: the query sails past the blocklist to the upstream.
    resolver
        .pipeline
        .kill_switches()
        .suspend_blocklist_until(chrono::Utc::now() + chrono::Duration::minutes(5));
    let while_suspended = resolver.query("ads.example.com", RecordType::A).await;
    assert!(!has_stage(&while_suspended, Stage::Blocklist));
    assert_eq!(upstream.query_count(), 1);

    // Cleared: blocking applies again.
    resolver.pipeline.kill_switches().clear_blocklist();
    let after_clear = resolver.query("ads.example.com", RecordType::A).await;
    assert!(has_stage(&after_clear, Stage::Blocklist));
    assert_eq!(upstream.query_count(), 1);
}

#[tokio::test]
async fn blocked_decision_is_cached_with_blocked_flag() {
    let upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let mut config = config_with_upstream(&upstream);
    config.blocking.custom_blocked = vec!["ads.example.com".to_string()];

    let resolver = TestResolver::start(config).await;
    resolver.query("ads.example.com", RecordType::A).await;

    // Dropping block decisions finds exactly the one entry; twice is a no-op.
    assert_eq!(resolver.pipeline.cache().clear_blocked(), 1);
    assert_eq!(resolver.pipeline.cache().clear_blocked(), 0);
}
