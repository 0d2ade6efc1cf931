//! Cache flows: hit-with-decayed-TTL, singleflight coalescing, negative
//! caching and clear semantics.

#[path = "../common/mod.rs"]
mod common;

use common::mock_upstream::{MockUpstream, UpstreamBehavior};
use common::{config_with_upstream, first_a, has_stage, TestResolver};
use futures::future::join_all;
use hickory_proto::op::ResponseCode;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use warden_dns_domain::{RecordType, Stage, TraceAction};

#[tokio::test]
async fn second_query_hits_cache_with_ttl_decay() {
    let upstream =
        MockUpstream::start(UpstreamBehavior::answering(Ipv4Addr::new(192, 0, 2, 10), 300))
            .await
            .unwrap();
    let resolver = TestResolver::start(config_with_upstream(&upstream)).await;

    let first = resolver.query("a.test", RecordType::A).await;
    assert!(has_stage(&first, Stage::Upstream));

    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = resolver.query("a.test", RecordType::A).await;
    let cache_entry = second
        .trace
        .iter()
        .find(|e| e.stage == Stage::Cache)
        .unwrap();
    assert_eq!(cache_entry.action, TraceAction::Hit);

    let ttl = second.response.as_ref().unwrap().answers()[0].ttl();
    assert!((299..=300).contains(&ttl), "ttl {} outside [299, 300]", ttl);
    assert_eq!(upstream.query_count(), 1, "only the first query went upstream");
}

#[tokio::test]
async fn fifty_concurrent_misses_coalesce_into_one_exchange() {
    let upstream = MockUpstream::start(UpstreamBehavior::slow(Duration::from_millis(200)))
        .await
        .unwrap();
    let mut config = config_with_upstream(&upstream);
    config.dns.query_timeout_ms = 2000;

    let resolver = Arc::new(TestResolver::start(config).await);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.query("slow.test", RecordType::A).await })
        })
        .collect();

    let outcomes = join_all(tasks).await;
    for outcome in outcomes {
        let outcome = outcome.unwrap();
        let response = outcome.response.as_ref().unwrap();
        assert_eq!(response.response_code(), ResponseCode::NoError);
        assert_eq!(first_a(&outcome), Some(Ipv4Addr::new(93, 184, 216, 34)));
    }

    assert_eq!(upstream.query_count(), 1, "singleflight issued one exchange");
}

#[tokio::test]
async fn nxdomain_is_negatively_cached() {
    let upstream = MockUpstream::start(UpstreamBehavior::nxdomain()).await.unwrap();
    let mut config = config_with_upstream(&upstream);
    config.cache.negative_ttl = 300;

    let resolver = TestResolver::start(config).await;

    let first = resolver.query("missing.test", RecordType::A).await;
    assert_eq!(
        first.response.as_ref().unwrap().response_code(),
        ResponseCode::NXDomain
    );

    let second = resolver.query("missing.test", RecordType::A).await;
    assert_eq!(
        second.response.as_ref().unwrap().response_code(),
        ResponseCode::NXDomain
    );
    assert!(has_stage(&second, Stage::Cache));
    assert_eq!(upstream.query_count(), 1, "negative answer served from cache");
}

#[tokio::test]
async fn clear_empties_cache_and_stats_agree() {
    let upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let resolver = TestResolver::start(config_with_upstream(&upstream)).await;

    resolver.query("one.test", RecordType::A).await;
    resolver.query("two.test", RecordType::A).await;
    assert!(resolver.pipeline.cache().stats().entries >= 2);

    resolver.pipeline.cache().clear();
    assert_eq!(resolver.pipeline.cache().stats().entries, 0);
}

#[tokio::test]
async fn distinct_fingerprints_do_not_collide() {
    let upstream = MockUpstream::start(UpstreamBehavior::default()).await.unwrap();
    let resolver = TestResolver::start(config_with_upstream(&upstream)).await;

    resolver.query("a.test", RecordType::A).await;
    let aaaa = resolver.query("a.test", RecordType::Aaaa).await;

    // Different qtype is a different fingerprint: both went upstream.
    assert!(has_stage(&aaaa, Stage::Upstream));
    assert_eq!(upstream.query_count(), 2);
}
