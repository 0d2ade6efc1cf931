//! Dependency wiring: builds the pipeline graph from a loaded config.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use warden_dns_application::PolicyEngine;
use warden_dns_domain::Config;
use warden_dns_infrastructure::dns::transport::UdpSocketPool;
use warden_dns_infrastructure::dns::{
    AnswerCache, BlocklistEngine, DnsServerHandler, KillSwitches, LocalRecordStore, QueryPipeline,
    RuleEvaluator, RulePolicyEngine, UpstreamForwarder, UpstreamPool, WhitelistStore,
};
use warden_dns_infrastructure::observability::{AtomicMetrics, BufferedQueryLog};
use warden_dns_infrastructure::sources::FetchingSourceLoader;
use warden_dns_infrastructure::SharedConfig;
use warden_dns_jobs::{BlocklistUpdateJob, CacheSweepJob, JobRunner, KillSwitchWatchJob};

/// Buffered query-log capacity before overflow drops records.
const QUERY_LOG_BUFFER: usize = 4096;

pub struct DnsServices {
    config: Arc<Config>,
    pipeline: Arc<QueryPipeline>,
    cache: Arc<AnswerCache>,
    blocklist: Arc<BlocklistEngine>,
    kill_switches: Arc<KillSwitches>,
    pub metrics: Arc<AtomicMetrics>,
}

impl DnsServices {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let shared = Arc::new(SharedConfig::new((*config).clone()));

        let whitelist = Arc::new(WhitelistStore::new(&config.whitelist));

        let loader = Arc::new(FetchingSourceLoader::new()?);
        let blocklist = Arc::new(BlocklistEngine::new(&config.blocking, loader));
        if config.blocking.enabled {
            // First compile happens before serving; the update job only
            // refreshes from here on.
            if let Err(e) = blocklist.update().await {
                tracing::warn!(error = %e, "Initial blocklist load failed; starting with an empty list");
            }
        }

        let local_records = Arc::new(LocalRecordStore::new(&config.local_records));
        let cache = Arc::new(AnswerCache::new(&config.cache));

        let pool = Arc::new(UpstreamPool::new(
            &config.dns.upstreams,
            config.circuit_breaker,
        )?);
        let forwarder = Arc::new(UpstreamForwarder::new(
            pool,
            Arc::new(UdpSocketPool::new(16)),
            Duration::from_millis(config.dns.query_timeout_ms),
            config.dns.retries,
        ));

        let rules = RuleEvaluator::compile(&config.conditional_forwarding)?;
        let policy: Arc<dyn PolicyEngine> = Arc::new(RulePolicyEngine::compile(&config.policies));
        let kill_switches = Arc::new(KillSwitches::from_config(&config.kill_switches));

        let metrics = Arc::new(AtomicMetrics::new());
        let query_log = BufferedQueryLog::spawn(QUERY_LOG_BUFFER);

        let pipeline = QueryPipeline::builder()
            .config(shared)
            .whitelist(whitelist)
            .blocklist(Arc::clone(&blocklist))
            .policy(policy)
            .local_records(local_records)
            .cache(Arc::clone(&cache))
            .rules(rules)
            .forwarder(forwarder)
            .kill_switches(Arc::clone(&kill_switches))
            .query_log(query_log)
            .metrics(Arc::clone(&metrics) as _)
            .build()?;

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            cache,
            blocklist,
            kill_switches,
            metrics,
        })
    }

    /// Register and start the background jobs.
    pub fn start_jobs(&self, cancel: CancellationToken) {
        let mut runner = JobRunner::new()
            .with_cache_sweep(CacheSweepJob::new(
                Arc::clone(&self.cache),
                Duration::from_secs(self.config.cache.sweep_interval_secs()),
            ))
            .with_kill_switch_watch(KillSwitchWatchJob::new(
                Arc::clone(&self.kill_switches),
                Duration::from_secs(1),
            ));

        if self.config.blocking.enabled && self.config.blocking.auto_update {
            runner = runner.with_blocklist_update(BlocklistUpdateJob::new(
                Arc::clone(&self.blocklist),
                Arc::clone(&self.cache),
                Duration::from_secs(self.config.blocking.update_interval_secs),
            ));
        }

        runner.start(cancel);
    }

    pub fn server_handler(&self, shutdown: CancellationToken) -> DnsServerHandler {
        DnsServerHandler::new(Arc::clone(&self.pipeline), shutdown)
    }

    pub fn bind_address(&self) -> String {
        format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.dns_port
        )
    }

    pub fn tcp_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.tcp_timeout_secs)
    }
}
