use super::QueryPipeline;
use crate::config_store::SharedConfig;
use crate::dns::block_filter::{BlocklistEngine, WhitelistStore};
use crate::dns::cache::AnswerCache;
use crate::dns::forwarder::UpstreamForwarder;
use crate::dns::kill_switch::KillSwitches;
use crate::dns::local_records::LocalRecordStore;
use crate::dns::rules::RuleEvaluator;
use arc_swap::ArcSwap;
use std::sync::Arc;
use warden_dns_application::{
    IngressLimiter, MetricsSink, NoopLimiter, NoopMetrics, NoopQueryLog, PolicyEngine,
    QueryLogSink,
};
use warden_dns_domain::{ClientInfo, PolicyDecision, Question, ResolveError};

/// No-op policy engine used when policies are disabled or not wired.
struct PassthroughPolicy;

impl PolicyEngine for PassthroughPolicy {
    fn evaluate(&self, _question: &Question, _client: &ClientInfo) -> PolicyDecision {
        PolicyDecision::Passthrough
    }
}

/// Assembles a [`QueryPipeline`]. The core components are required; every
/// collaborator defaults to its no-op implementation.
pub struct PipelineBuilder {
    config: Option<Arc<SharedConfig>>,
    whitelist: Option<Arc<WhitelistStore>>,
    blocklist: Option<Arc<BlocklistEngine>>,
    policy: Option<Arc<dyn PolicyEngine>>,
    local_records: Option<Arc<LocalRecordStore>>,
    cache: Option<Arc<AnswerCache>>,
    rules: Option<RuleEvaluator>,
    forwarder: Option<Arc<UpstreamForwarder>>,
    kill_switches: Option<Arc<KillSwitches>>,
    limiter: Arc<dyn IngressLimiter>,
    query_log: Arc<dyn QueryLogSink>,
    metrics: Arc<dyn MetricsSink>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            whitelist: None,
            blocklist: None,
            policy: None,
            local_records: None,
            cache: None,
            rules: None,
            forwarder: None,
            kill_switches: None,
            limiter: Arc::new(NoopLimiter),
            query_log: Arc::new(NoopQueryLog),
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn config(mut self, config: Arc<SharedConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn whitelist(mut self, whitelist: Arc<WhitelistStore>) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    pub fn blocklist(mut self, blocklist: Arc<BlocklistEngine>) -> Self {
        self.blocklist = Some(blocklist);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn PolicyEngine>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn local_records(mut self, local_records: Arc<LocalRecordStore>) -> Self {
        self.local_records = Some(local_records);
        self
    }

    pub fn cache(mut self, cache: Arc<AnswerCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn rules(mut self, rules: RuleEvaluator) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn forwarder(mut self, forwarder: Arc<UpstreamForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn kill_switches(mut self, kill_switches: Arc<KillSwitches>) -> Self {
        self.kill_switches = Some(kill_switches);
        self
    }

    pub fn limiter(mut self, limiter: Arc<dyn IngressLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn query_log(mut self, query_log: Arc<dyn QueryLogSink>) -> Self {
        self.query_log = query_log;
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn build(self) -> Result<QueryPipeline, ResolveError> {
        let missing = |what: &str| ResolveError::Internal(format!("pipeline builder missing {}", what));

        Ok(QueryPipeline {
            config: self.config.ok_or_else(|| missing("config"))?,
            whitelist: self.whitelist.ok_or_else(|| missing("whitelist"))?,
            blocklist: self.blocklist.ok_or_else(|| missing("blocklist"))?,
            policy: self.policy.unwrap_or_else(|| Arc::new(PassthroughPolicy)),
            local_records: self.local_records.ok_or_else(|| missing("local records"))?,
            cache: self.cache.ok_or_else(|| missing("cache"))?,
            rules: ArcSwap::from_pointee(self.rules.unwrap_or_else(RuleEvaluator::empty)),
            forwarder: self.forwarder.ok_or_else(|| missing("forwarder"))?,
            kill_switches: self
                .kill_switches
                .unwrap_or_else(|| Arc::new(KillSwitches::new())),
            limiter: self.limiter,
            query_log: self.query_log,
            metrics: self.metrics,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
