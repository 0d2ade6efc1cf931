#![allow(dead_code)]

pub mod mock_upstream;

use mock_upstream::MockUpstream;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use warden_dns_domain::{ClientInfo, Config, QueryClass, RecordType, Stage, Transport};
use warden_dns_infrastructure::dns::pipeline::{PipelineOutcome, PipelineRequest};
use warden_dns_infrastructure::dns::transport::UdpSocketPool;
use warden_dns_infrastructure::dns::{
    AnswerCache, BlocklistEngine, KillSwitches, LocalRecordStore, QueryPipeline, RuleEvaluator,
    RulePolicyEngine, UpstreamForwarder, UpstreamPool, WhitelistStore,
};
use warden_dns_infrastructure::sources::FetchingSourceLoader;
use warden_dns_infrastructure::SharedConfig;

/// A resolver wired exactly the way the binary wires one, minus sockets.
pub struct TestResolver {
    pub pipeline: Arc<QueryPipeline>,
    pub pool: Arc<UpstreamPool>,
}

impl TestResolver {
    pub async fn start(config: Config) -> TestResolver {
        let shared = Arc::new(SharedConfig::new(config.clone()));
        let whitelist = Arc::new(WhitelistStore::new(&config.whitelist));

        let loader = Arc::new(FetchingSourceLoader::new().expect("http client"));
        let blocklist = Arc::new(BlocklistEngine::new(&config.blocking, loader));
        blocklist.update().await.expect("blocklist compile");

        let local_records = Arc::new(LocalRecordStore::new(&config.local_records));
        let cache = Arc::new(AnswerCache::new(&config.cache));

        let pool = Arc::new(
            UpstreamPool::new(&config.dns.upstreams, config.circuit_breaker)
                .expect("upstream pool"),
        );
        let forwarder = Arc::new(UpstreamForwarder::new(
            Arc::clone(&pool),
            Arc::new(UdpSocketPool::new(8)),
            Duration::from_millis(config.dns.query_timeout_ms),
            config.dns.retries,
        ));

        let rules =
            RuleEvaluator::compile(&config.conditional_forwarding).expect("rules compile");
        let policy = Arc::new(RulePolicyEngine::compile(&config.policies));

        let pipeline = QueryPipeline::builder()
            .config(shared)
            .whitelist(whitelist)
            .blocklist(blocklist)
            .policy(policy)
            .local_records(local_records)
            .cache(cache)
            .rules(rules)
            .forwarder(forwarder)
            .kill_switches(Arc::new(KillSwitches::from_config(&config.kill_switches)))
            .build()
            .expect("pipeline build");

        TestResolver {
            pipeline: Arc::new(pipeline),
            pool,
        }
    }

    pub async fn query(&self, name: &str, record_type: RecordType) -> PipelineOutcome {
        self.pipeline
            .handle(request(name, record_type), CancellationToken::new())
            .await
    }
}

/// Config pointing at one mock upstream, with test-friendly timeouts.
pub fn config_with_upstream(upstream: &MockUpstream) -> Config {
    let mut config = Config::default();
    config.dns.upstreams = vec![upstream.addr_string()];
    config.dns.query_timeout_ms = 500;
    config.cache.min_ttl = 1;
    config
}

pub fn request(name: &str, record_type: RecordType) -> PipelineRequest {
    PipelineRequest {
        id: fastrand::u16(..),
        question_count: 1,
        name: name.to_string(),
        record_type,
        class: QueryClass::In,
        recursion_desired: true,
        checking_disabled: false,
        dnssec_ok: false,
        client: ClientInfo::new("10.0.0.5".parse().unwrap(), Transport::Udp),
    }
}

pub fn first_a(outcome: &PipelineOutcome) -> Option<Ipv4Addr> {
    outcome.response.as_ref().and_then(|message| {
        message.answers().iter().find_map(|record| match record.data() {
            hickory_proto::rr::RData::A(a) => Some(a.0),
            _ => None,
        })
    })
}

pub fn has_stage(outcome: &PipelineOutcome, stage: Stage) -> bool {
    outcome.trace.iter().any(|entry| entry.stage == stage)
}
