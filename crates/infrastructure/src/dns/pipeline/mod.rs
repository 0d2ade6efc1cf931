//! The query pipeline: walks each query through a fixed stage sequence —
//! validate, rate limit, whitelist, blocklist, policy, local records,
//! cache, conditional forwarding, upstream — and always produces a
//! response plus an ordered trace. Nothing escapes as a panic or error.

mod builder;

pub use builder::PipelineBuilder;

use crate::config_store::SharedConfig;
use crate::dns::block_filter::{BlocklistEngine, WhitelistStore};
use crate::dns::cache::{AnswerCache, CacheKey, EntryFlags, SharedResponse};
use crate::dns::codec::{is_negative, min_answer_ttl, MessageBuilder, Synthesizer};
use crate::dns::forwarder::UpstreamForwarder;
use crate::dns::kill_switch::KillSwitches;
use crate::dns::local_records::{LocalLookup, LocalRecordStore};
use crate::dns::rules::RuleEvaluator;
use arc_swap::ArcSwap;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::Record;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use warden_dns_application::{
    IngressLimiter, LimiterVerdict, MetricsSink, PolicyEngine, QueryLogSink, QuerySummary,
};
use warden_dns_domain::{
    ClientInfo, Config, PolicyDecision, QueryClass, QueryTrace, Question, RecordType,
    ResolveError, Stage, TraceAction, TraceEntry,
};

/// Alias chains are followed at most this deep.
const MAX_CNAME_DEPTH: usize = 8;

/// TTL on synthesized policy-redirect answers.
const REDIRECT_TTL: u32 = 300;

/// One parsed inbound query, as handed over by a transport frontend.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub id: u16,
    /// Question-section count from the wire; anything but 1 is FORMERR.
    pub question_count: usize,
    pub name: String,
    pub record_type: RecordType,
    pub class: QueryClass,
    pub recursion_desired: bool,
    pub checking_disabled: bool,
    pub dnssec_ok: bool,
    pub client: ClientInfo,
}

/// What the pipeline hands back to the transport.
pub struct PipelineOutcome {
    /// `None` means drop silently (rate limiter said so).
    pub response: Option<Message>,
    pub trace: Arc<[TraceEntry]>,
}

pub struct QueryPipeline {
    config: Arc<SharedConfig>,
    whitelist: Arc<WhitelistStore>,
    blocklist: Arc<BlocklistEngine>,
    policy: Arc<dyn PolicyEngine>,
    local_records: Arc<LocalRecordStore>,
    cache: Arc<AnswerCache>,
    rules: ArcSwap<RuleEvaluator>,
    forwarder: Arc<UpstreamForwarder>,
    kill_switches: Arc<KillSwitches>,
    limiter: Arc<dyn IngressLimiter>,
    query_log: Arc<dyn QueryLogSink>,
    metrics: Arc<dyn MetricsSink>,
}

/// Forwarding plan captured from a matched rule, owned by the spawned
/// singleflight fetch.
struct RulePlan {
    upstreams: Vec<(SocketAddr, Arc<str>)>,
    timeout: Option<Duration>,
    retries: Option<usize>,
    failover: bool,
}

impl QueryPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Replace the compiled conditional-forwarding rules (config reload).
    pub fn swap_rules(&self, evaluator: RuleEvaluator) {
        self.rules.store(Arc::new(evaluator));
    }

    pub fn cache(&self) -> &Arc<AnswerCache> {
        &self.cache
    }

    pub fn blocklist(&self) -> &Arc<BlocklistEngine> {
        &self.blocklist
    }

    pub fn kill_switches(&self) -> &Arc<KillSwitches> {
        &self.kill_switches
    }

    /// Drive one query through the stage sequence.
    ///
    /// Always returns: protocol errors become FORMERR/REFUSED, everything
    /// else that goes wrong becomes SERVFAIL. The trace is non-empty for
    /// every query, short-circuits included.
    pub async fn handle(
        &self,
        request: PipelineRequest,
        cancel: CancellationToken,
    ) -> PipelineOutcome {
        let config = self.config.load();
        let mut trace = QueryTrace::new();
        self.metrics.incr("queries_total");

        // Stage 1: parse & validate.
        let question = match self.validate(&request) {
            Ok(question) => question,
            Err(_) => {
                trace.record(
                    Stage::Response,
                    TraceAction::Error,
                    None,
                    Some(Arc::from("formerr")),
                );
                let response =
                    Synthesizer::error(request.id, request.recursion_desired, None, ResponseCode::FormErr);
                return self.finish(&request, None, Some(response), trace, false, false);
            }
        };

        // Stage 2: ingress rate limit (collaborator verdict only).
        match self.limiter.check(request.client.ip) {
            LimiterVerdict::Allow => {}
            LimiterVerdict::Refuse => {
                self.metrics.incr("queries_refused");
                trace.record(
                    Stage::Response,
                    TraceAction::Error,
                    None,
                    Some(Arc::from("ratelimit")),
                );
                let response = Synthesizer::error(
                    request.id,
                    request.recursion_desired,
                    Some(&question),
                    ResponseCode::Refused,
                );
                return self.finish(&request, Some(&question), Some(response), trace, false, false);
            }
            LimiterVerdict::Drop => {
                self.metrics.incr("queries_dropped");
                trace.record(
                    Stage::Response,
                    TraceAction::Error,
                    None,
                    Some(Arc::from("ratelimit-drop")),
                );
                return self.finish(&request, Some(&question), None, trace, false, false);
            }
        }

        let deadline = Duration::from_millis(config.dns.pipeline_deadline_ms);
        let resolved = tokio::select! {
            _ = cancel.cancelled() => Err(ResolveError::DeadlineExceeded),
            timed = tokio::time::timeout(
                deadline,
                self.resolve(&config, &question, &request, &mut trace),
            ) => match timed {
                Ok(result) => result,
                Err(_) => Err(ResolveError::DeadlineExceeded),
            },
        };

        match resolved {
            Ok(staged) => {
                let blocked = staged.blocked;
                let cache_hit = staged.cache_hit;
                self.finish(&request, Some(&question), Some(staged.response), trace, blocked, cache_hit)
            }
            Err(error) => {
                let (rcode, source) = match &error {
                    ResolveError::DeadlineExceeded => {
                        self.metrics.incr("queries_deadline_exceeded");
                        (ResponseCode::ServFail, "timeout")
                    }
                    ResolveError::MalformedQuery(_) | ResolveError::InvalidDomainName(_) => {
                        (ResponseCode::FormErr, "formerr")
                    }
                    ResolveError::Refused(_) => (ResponseCode::Refused, "refused"),
                    other => {
                        self.metrics.incr("queries_failed");
                        if !other.is_transport() {
                            error!(error = %other, domain = %question.name, "Pipeline internal error");
                        }
                        (ResponseCode::ServFail, "upstream")
                    }
                };
                trace.record(
                    Stage::Response,
                    TraceAction::Error,
                    None,
                    Some(Arc::from(source)),
                );
                let response =
                    Synthesizer::error(request.id, request.recursion_desired, Some(&question), rcode);
                self.finish(&request, Some(&question), Some(response), trace, false, false)
            }
        }
    }

    fn validate(&self, request: &PipelineRequest) -> Result<Question, ResolveError> {
        if request.question_count != 1 {
            return Err(ResolveError::MalformedQuery(format!(
                "question count {} != 1",
                request.question_count
            )));
        }
        if request.class != QueryClass::In {
            return Err(ResolveError::MalformedQuery(format!(
                "unsupported class {}",
                request.class
            )));
        }

        let question = Question::new(&request.name, request.record_type);
        if question.name.is_empty()
            || hickory_proto::rr::Name::from_utf8(&question.name).is_err()
        {
            return Err(ResolveError::MalformedQuery(format!(
                "malformed name '{}'",
                request.name
            )));
        }
        Ok(question)
    }

    /// Stages 3–10. Terminal stages return a finished response with the
    /// client's id already applied.
    async fn resolve(
        &self,
        config: &Arc<Config>,
        question: &Question,
        request: &PipelineRequest,
        trace: &mut QueryTrace,
    ) -> Result<StagedResponse, ResolveError> {
        // Stage 3: whitelist. A hit shields this query from every block
        // decision downstream.
        let whitelisted = self.whitelist.find(&question.name);
        if let Some(hit) = &whitelisted {
            trace.record(
                Stage::Whitelist,
                TraceAction::Allow,
                Some(Arc::clone(&hit.pattern)),
                Some(Arc::clone(&hit.source)),
            );
        }

        // Stage 4: blocklist.
        if whitelisted.is_none()
            && config.blocking.enabled
            && config.features.blocklist_enabled
            && !self.kill_switches.blocklist_suspended()
        {
            if let Some(hit) = self.blocklist.find(&question.name) {
                trace.record(
                    Stage::Blocklist,
                    TraceAction::Block,
                    Some(Arc::clone(&hit.pattern)),
                    Some(Arc::clone(&hit.source)),
                );
                self.metrics.incr("queries_blocked");

                let response = Synthesizer::blocked(
                    request.id,
                    request.recursion_desired,
                    question,
                    config.blocking.block_mode,
                    config.cache.blocked_ttl,
                )?;
                if config.cache.enabled {
                    self.cache.insert(
                        CacheKey::new(question, request.dnssec_ok),
                        response.clone(),
                        config.cache.blocked_ttl,
                        EntryFlags {
                            negative: false,
                            blocked: true,
                        },
                    );
                }
                return Ok(StagedResponse::blocked(response));
            }
        }

        // Stage 5: policy evaluation.
        if config.policies.enabled
            && config.features.policies_enabled
            && !self.kill_switches.policies_suspended()
        {
            match self.policy.evaluate(question, &request.client) {
                PolicyDecision::Passthrough => {}
                PolicyDecision::Allow => {
                    trace.record(Stage::Policy, TraceAction::Allow, None, None);
                }
                PolicyDecision::Block { rule } => {
                    // Whitelist wins over policy blocks.
                    if whitelisted.is_none() {
                        trace.record(
                            Stage::Policy,
                            TraceAction::Block,
                            Some(Arc::clone(&rule)),
                            None,
                        );
                        self.metrics.incr("queries_blocked");

                        let response = Synthesizer::blocked(
                            request.id,
                            request.recursion_desired,
                            question,
                            config.blocking.block_mode,
                            config.cache.blocked_ttl,
                        )?;
                        if config.cache.enabled {
                            self.cache.insert(
                                CacheKey::new(question, request.dnssec_ok),
                                response.clone(),
                                config.cache.blocked_ttl,
                                EntryFlags {
                                    negative: false,
                                    blocked: true,
                                },
                            );
                        }
                        return Ok(StagedResponse::blocked(response));
                    }
                }
                PolicyDecision::Redirect { rule, target } => {
                    trace.record(
                        Stage::Policy,
                        TraceAction::Redirect,
                        Some(Arc::clone(&rule)),
                        None,
                    );
                    let response = Synthesizer::redirect(
                        request.id,
                        request.recursion_desired,
                        question,
                        &target,
                        REDIRECT_TTL,
                    )?;
                    return Ok(StagedResponse::plain(response));
                }
            }
        }

        // Stage 6: local records, with bounded alias following.
        if let Some(lookup) = self.local_records.lookup(&question.name, question.record_type) {
            return self.answer_local(config, question, request, trace, lookup).await;
        }

        // Stages 7–10.
        self.resolve_remote(config, question, request, trace).await
    }

    /// Stages 7–10: cache lookup, conditional-forwarding selection, upstream
    /// forward under singleflight, post-process & cache.
    async fn resolve_remote(
        &self,
        config: &Arc<Config>,
        question: &Question,
        request: &PipelineRequest,
        trace: &mut QueryTrace,
    ) -> Result<StagedResponse, ResolveError> {
        let key = CacheKey::new(question, request.dnssec_ok);

        // Stage 7: cache lookup.
        if config.cache.enabled {
            if let Some(mut cached) = self.cache.get(&key) {
                trace.record(Stage::Cache, TraceAction::Hit, None, None);
                self.metrics.incr("cache_hits");
                cached.set_id(request.id);
                cached.set_recursion_desired(request.recursion_desired);
                cached.set_recursion_available(true);
                return Ok(StagedResponse::cache_hit(cached));
            }
            trace.record(Stage::Cache, TraceAction::Miss, None, None);
            self.metrics.incr("cache_misses");
        }

        // Stage 8: conditional-forwarding selection.
        let rules = self.rules.load();
        let rule_plan = match rules.evaluate(&question.name, request.client.ip, question.record_type)
        {
            Some(rule) => {
                trace.record(
                    Stage::ConditionalForward,
                    TraceAction::Forward,
                    Some(Arc::clone(&rule.name)),
                    None,
                );
                Some(RulePlan {
                    upstreams: rule.upstreams.clone(),
                    timeout: rule.timeout,
                    retries: rule.retries,
                    failover: rule.failover,
                })
            }
            None => None,
        };

        // Stages 9–10: upstream forward with singleflight around the
        // fingerprint; the shared fetch inserts into the cache before it
        // resolves, so every waiter observes the same entry.
        let upstream_query =
            MessageBuilder::upstream_query(question, request.dnssec_ok, request.checking_disabled)?;
        let fetch = {
            let cache = Arc::clone(&self.cache);
            let forwarder = Arc::clone(&self.forwarder);
            let key = key.clone();
            let cache_enabled = config.cache.enabled;
            let name = Arc::clone(&question.name);

            async move {
                let outcome = match &rule_plan {
                    Some(plan) => {
                        match forwarder
                            .forward_to(&upstream_query, &plan.upstreams, plan.timeout, plan.retries)
                            .await
                        {
                            Ok(outcome) => Ok(outcome),
                            Err(error) if plan.failover => {
                                debug!(
                                    domain = %name,
                                    error = %error,
                                    "Rule upstreams failed; falling back to default pool"
                                );
                                forwarder.forward(&upstream_query).await
                            }
                            Err(error) => Err(error),
                        }
                    }
                    None => forwarder.forward(&upstream_query).await,
                };

                let outcome = outcome?;
                let response = outcome.response;

                if cache_enabled {
                    let negative = is_negative(&response);
                    let ttl_hint = min_answer_ttl(&response).unwrap_or(0);
                    cache.insert(
                        key,
                        response.clone(),
                        ttl_hint,
                        EntryFlags {
                            negative,
                            blocked: false,
                        },
                    );
                }

                Ok(SharedResponse {
                    message: Arc::new(response),
                    server: outcome.server,
                })
            }
        };

        match self.cache.resolve_shared(&key, fetch).await {
            Ok(shared) => {
                trace.record(
                    Stage::Upstream,
                    TraceAction::Forward,
                    None,
                    Some(Arc::clone(&shared.server)),
                );
                let mut response = (*shared.message).clone();
                response.set_id(request.id);
                response.set_recursion_desired(request.recursion_desired);
                response.set_recursion_available(true);
                Ok(StagedResponse::plain(response))
            }
            Err(error) => {
                let source: Arc<str> = match &error {
                    ResolveError::UpstreamTimeout { server } => Arc::from(server.as_str()),
                    ResolveError::UpstreamNetwork { server, .. } => Arc::from(server.as_str()),
                    ResolveError::CircuitOpen { server } => Arc::from(server.as_str()),
                    _ => Arc::from("upstream"),
                };
                trace.record(Stage::Upstream, TraceAction::Error, None, Some(source));
                self.metrics.incr("upstream_errors");
                Err(error)
            }
        }
    }

    /// Stage 6 terminal: authoritative overlay answers, following CNAME
    /// aliases locally first and through cache/upstream for the tail.
    async fn answer_local(
        &self,
        config: &Arc<Config>,
        question: &Question,
        request: &PipelineRequest,
        trace: &mut QueryTrace,
        lookup: LocalLookup,
    ) -> Result<StagedResponse, ResolveError> {
        trace.record(Stage::Local, TraceAction::Synthesize, None, None);
        self.metrics.incr("local_answers");

        let (mut answers, alias_tail) = match lookup {
            LocalLookup::Records(records) => (records, None),
            LocalLookup::Alias { record, target } => {
                let mut answers: Vec<Record> = vec![record];
                let mut current = target;
                let mut tail = None;

                for _ in 1..MAX_CNAME_DEPTH {
                    match self
                        .local_records
                        .lookup(&current, question.record_type)
                    {
                        Some(LocalLookup::Records(mut records)) => {
                            answers.append(&mut records);
                            tail = None;
                            break;
                        }
                        Some(LocalLookup::Alias { record, target }) => {
                            answers.push(record);
                            current = Arc::clone(&target);
                            tail = Some(target);
                        }
                        None => {
                            tail = Some(current);
                            break;
                        }
                    }
                }
                (answers, tail)
            }
        };

        match alias_tail {
            None => {
                let response = Synthesizer::answer(
                    request.id,
                    request.recursion_desired,
                    question,
                    answers,
                    true,
                )?;
                Ok(StagedResponse::plain(response))
            }
            Some(target) => {
                // The chain leaves the overlay: resolve the tail through the
                // cache/upstream path and append its answers. Not marked
                // authoritative, since part of the answer is not ours.
                let tail_question = Question::new(&target, question.record_type);
                let tail = self
                    .resolve_remote(config, &tail_question, request, trace)
                    .await?;
                answers.extend_from_slice(tail.response.answers());
                let response = Synthesizer::answer(
                    request.id,
                    request.recursion_desired,
                    question,
                    answers,
                    false,
                )?;
                Ok(StagedResponse::plain(response))
            }
        }
    }

    /// Emit the query log record and metrics, then package the outcome.
    fn finish(
        &self,
        request: &PipelineRequest,
        question: Option<&Question>,
        response: Option<Message>,
        trace: QueryTrace,
        blocked: bool,
        cache_hit: bool,
    ) -> PipelineOutcome {
        let duration = trace.started().elapsed();
        self.metrics.observe_latency("pipeline", duration);

        let trace: Arc<[TraceEntry]> = Arc::from(trace.into_entries());
        let name: Arc<str> = match question {
            Some(q) => Arc::clone(&q.name),
            None => Arc::from(request.name.as_str()),
        };
        let rcode = response
            .as_ref()
            .map(|r| u16::from(r.response_code()))
            .unwrap_or(u16::from(ResponseCode::Refused));

        self.query_log.record(QuerySummary {
            name,
            record_type: request.record_type,
            client: request.client.ip,
            transport: request.client.transport,
            rcode,
            blocked,
            cache_hit,
            duration,
            trace: Arc::clone(&trace),
        });

        PipelineOutcome { response, trace }
    }
}

/// Response plus the flags the query log wants.
struct StagedResponse {
    response: Message,
    blocked: bool,
    cache_hit: bool,
}

impl StagedResponse {
    fn plain(response: Message) -> Self {
        Self {
            response,
            blocked: false,
            cache_hit: false,
        }
    }

    fn blocked(response: Message) -> Self {
        Self {
            response,
            blocked: true,
            cache_hit: false,
        }
    }

    fn cache_hit(response: Message) -> Self {
        Self {
            response,
            blocked: false,
            cache_hit: true,
        }
    }
}
