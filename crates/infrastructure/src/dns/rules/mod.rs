//! Conditional-forwarding rule evaluator.
//!
//! Rules are compiled once at load/reload into matcher sets and kept sorted
//! by priority descending; per query, the first rule whose non-empty
//! matchers all accept wins. No match means the caller uses the default
//! upstream pool.

use compact_str::CompactString;
use fancy_regex::Regex;
use rustc_hash::FxHashSet;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use warden_dns_domain::config::ConditionalForwardingConfig;
use warden_dns_domain::{normalize_name, RecordType, ResolveError, SubnetSet};

/// Domain matcher buckets. An empty matcher accepts everything.
#[derive(Default)]
struct DomainMatcher {
    exact: FxHashSet<CompactString>,
    /// `(".corp", "corp")`: suffix match OR equality with the bare stem.
    suffixes: Vec<(CompactString, CompactString)>,
    /// `"internal."` from `internal.*`.
    prefixes: Vec<CompactString>,
    regexes: Vec<Regex>,
}

impl DomainMatcher {
    fn compile(patterns: &[String]) -> Result<Self, ResolveError> {
        let mut matcher = DomainMatcher::default();

        for pattern in patterns {
            let pattern = normalize_name(pattern.trim());
            if pattern.is_empty() {
                continue;
            }

            if pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/') {
                let body = &pattern[1..pattern.len() - 1];
                let regex = Regex::new(body).map_err(|e| {
                    ResolveError::Internal(format!("invalid rule regex '{}': {}", body, e))
                })?;
                matcher.regexes.push(regex);
            } else if let Some(stem) = pattern.strip_prefix("*.") {
                matcher.suffixes.push((
                    CompactString::new(format!(".{}", stem)),
                    CompactString::new(stem),
                ));
            } else if let Some(stem) = pattern.strip_suffix(".*") {
                matcher.prefixes.push(CompactString::new(format!("{}.", stem)));
            } else {
                matcher.exact.insert(CompactString::new(pattern));
            }
        }

        Ok(matcher)
    }

    fn is_empty(&self) -> bool {
        self.exact.is_empty()
            && self.suffixes.is_empty()
            && self.prefixes.is_empty()
            && self.regexes.is_empty()
    }

    fn matches(&self, name: &str) -> bool {
        if self.exact.contains(name) {
            return true;
        }
        if self
            .suffixes
            .iter()
            .any(|(suffix, stem)| name.ends_with(suffix.as_str()) || name == stem.as_str())
        {
            return true;
        }
        if self.prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return true;
        }
        self.regexes
            .iter()
            .any(|r| r.is_match(name).unwrap_or(false))
    }
}

/// One compiled conditional-forwarding rule.
pub struct CompiledRule {
    pub name: Arc<str>,
    pub priority: i32,
    domains: DomainMatcher,
    clients: SubnetSet,
    record_types: FxHashSet<RecordType>,
    pub upstreams: Vec<(SocketAddr, Arc<str>)>,
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub failover: bool,
}

impl CompiledRule {
    fn accepts(&self, name: &str, client: IpAddr, record_type: RecordType) -> bool {
        if !self.domains.is_empty() && !self.domains.matches(name) {
            return false;
        }
        if !self.clients.is_empty() && !self.clients.contains(client) {
            return false;
        }
        if !self.record_types.is_empty() && !self.record_types.contains(&record_type) {
            return false;
        }
        true
    }
}

pub struct RuleEvaluator {
    rules: Vec<CompiledRule>,
}

impl RuleEvaluator {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn compile(config: &ConditionalForwardingConfig) -> Result<Self, ResolveError> {
        if !config.enabled {
            return Ok(Self::empty());
        }

        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in config.rules.iter().filter(|r| r.enabled) {
            let mut upstreams = Vec::with_capacity(rule.upstreams.len());
            for address in &rule.upstreams {
                let addr: SocketAddr = address.parse().map_err(|e| {
                    ResolveError::Internal(format!(
                        "rule '{}' has invalid upstream '{}': {}",
                        rule.name, address, e
                    ))
                })?;
                upstreams.push((addr, Arc::from(addr.to_string().as_str())));
            }

            let mut record_types = FxHashSet::default();
            for type_name in &rule.record_types {
                let record_type = RecordType::from_str(type_name).map_err(|e| {
                    ResolveError::Internal(format!("rule '{}': {}", rule.name, e))
                })?;
                record_types.insert(record_type);
            }

            let clients = SubnetSet::parse(&rule.client_cidrs)
                .map_err(|e| ResolveError::Internal(format!("rule '{}': {}", rule.name, e)))?;

            rules.push(CompiledRule {
                name: Arc::from(rule.name.as_str()),
                priority: rule.priority,
                domains: DomainMatcher::compile(&rule.domains)?,
                clients,
                record_types,
                upstreams,
                timeout: rule.timeout_ms.map(Duration::from_millis),
                retries: rule.retries,
                failover: rule.failover,
            });
        }

        // Stable sort: ties keep config order.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        info!(rules = rules.len(), "Conditional forwarding rules compiled");
        Ok(Self { rules })
    }

    /// First match wins; `None` means the defaults apply.
    pub fn evaluate(
        &self,
        name: &str,
        client: IpAddr,
        record_type: RecordType,
    ) -> Option<&CompiledRule> {
        self.rules
            .iter()
            .find(|rule| rule.accepts(name, client, record_type))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_dns_domain::config::ForwardRuleConfig;

    fn rule(name: &str, priority: i32, domains: &[&str], upstream: &str) -> ForwardRuleConfig {
        ForwardRuleConfig {
            name: name.to_string(),
            priority,
            domains: domains.iter().map(|s| s.to_string()).collect(),
            client_cidrs: vec![],
            record_types: vec![],
            upstreams: vec![upstream.to_string()],
            timeout_ms: None,
            retries: None,
            failover: true,
            enabled: true,
        }
    }

    fn evaluator(rules: Vec<ForwardRuleConfig>) -> RuleEvaluator {
        RuleEvaluator::compile(&ConditionalForwardingConfig {
            enabled: true,
            rules,
        })
        .unwrap()
    }

    fn client() -> IpAddr {
        "10.0.0.5".parse().unwrap()
    }

    #[test]
    fn suffix_wildcard_matches_subdomains_and_stem() {
        let ev = evaluator(vec![rule("corp", 90, &["*.corp"], "10.0.0.53:53")]);

        assert!(ev.evaluate("intranet.corp", client(), RecordType::A).is_some());
        assert!(ev.evaluate("corp", client(), RecordType::A).is_some());
        assert!(ev.evaluate("corporate.example", client(), RecordType::A).is_none());
    }

    #[test]
    fn prefix_wildcard_matches() {
        let ev = evaluator(vec![rule("internal", 10, &["internal.*"], "10.0.0.53:53")]);
        assert!(ev.evaluate("internal.example.com", client(), RecordType::A).is_some());
        assert!(ev.evaluate("external.example.com", client(), RecordType::A).is_none());
    }

    #[test]
    fn regex_pattern_matches() {
        let ev = evaluator(vec![rule("labs", 10, &["/^lab[0-9]+\\.test$/"], "10.0.0.53:53")]);
        assert!(ev.evaluate("lab42.test", client(), RecordType::A).is_some());
        assert!(ev.evaluate("lab.test", client(), RecordType::A).is_none());
    }

    #[test]
    fn highest_priority_wins() {
        let ev = evaluator(vec![
            rule("low", 10, &["*.corp"], "10.0.0.1:53"),
            rule("high", 90, &["*.corp"], "10.0.0.2:53"),
        ]);

        let matched = ev.evaluate("x.corp", client(), RecordType::A).unwrap();
        assert_eq!(&*matched.name, "high");
    }

    #[test]
    fn empty_matchers_match_everything() {
        let ev = evaluator(vec![rule("all", 0, &[], "10.0.0.53:53")]);
        assert!(ev.evaluate("anything.example", client(), RecordType::Txt).is_some());
    }

    #[test]
    fn cidr_restriction_applies() {
        let mut r = rule("corp", 50, &["*.corp"], "10.0.0.53:53");
        r.client_cidrs = vec!["192.168.0.0/16".to_string()];
        let ev = evaluator(vec![r]);

        assert!(ev
            .evaluate("a.corp", "192.168.1.10".parse().unwrap(), RecordType::A)
            .is_some());
        assert!(ev.evaluate("a.corp", client(), RecordType::A).is_none());
    }

    #[test]
    fn record_type_restriction_applies() {
        let mut r = rule("v4only", 50, &["*.corp"], "10.0.0.53:53");
        r.record_types = vec!["a".to_string()];
        let ev = evaluator(vec![r]);

        assert!(ev.evaluate("a.corp", client(), RecordType::A).is_some());
        assert!(ev.evaluate("a.corp", client(), RecordType::Aaaa).is_none());
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let mut r = rule("off", 50, &["*.corp"], "10.0.0.53:53");
        r.enabled = false;
        let ev = evaluator(vec![r]);
        assert!(ev.evaluate("a.corp", client(), RecordType::A).is_none());
    }
}
