//! Config-driven policy engine: the default implementation of the
//! `PolicyEngine` port. Rules are compiled once and evaluated in priority
//! order; domain patterns share the blocklist pattern grammar.

use crate::dns::block_filter::{parse_lines, ListSnapshot, ListSnapshotBuilder};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn};
use warden_dns_application::PolicyEngine;
use warden_dns_domain::config::PoliciesConfig;
use warden_dns_domain::{
    normalize_name, ClientInfo, PolicyDecision, Question, RedirectTarget, SubnetSet,
};

enum CompiledAction {
    Allow,
    Block,
    Redirect(RedirectTarget),
}

struct CompiledPolicyRule {
    name: Arc<str>,
    priority: i32,
    action: CompiledAction,
    domains: ListSnapshot,
    clients: SubnetSet,
}

impl CompiledPolicyRule {
    fn accepts(&self, name: &str, client: IpAddr) -> bool {
        if !self.domains.is_empty() && self.domains.find(name).is_none() {
            return false;
        }
        if !self.clients.is_empty() && !self.clients.contains(client) {
            return false;
        }
        true
    }
}

pub struct RulePolicyEngine {
    rules: Vec<CompiledPolicyRule>,
}

impl RulePolicyEngine {
    pub fn compile(config: &PoliciesConfig) -> Self {
        let mut rules = Vec::with_capacity(config.rules.len());

        for rule in config.rules.iter().filter(|r| r.enabled) {
            let action = match rule.action.to_ascii_lowercase().as_str() {
                "allow" => CompiledAction::Allow,
                "block" => CompiledAction::Block,
                "redirect" => match &rule.target {
                    Some(target) => CompiledAction::Redirect(parse_target(target)),
                    None => {
                        warn!(rule = %rule.name, "Redirect policy without target; skipping");
                        continue;
                    }
                },
                other => {
                    warn!(rule = %rule.name, action = %other, "Unknown policy action; skipping");
                    continue;
                }
            };

            let clients = match SubnetSet::parse(&rule.client_cidrs) {
                Ok(set) => set,
                Err(e) => {
                    warn!(rule = %rule.name, error = %e, "Invalid policy CIDR; skipping rule");
                    continue;
                }
            };

            let source: Arc<str> = Arc::from(rule.name.as_str());
            let mut builder = ListSnapshotBuilder::new();
            builder.add_source(&source, parse_lines(rule.domains.iter().map(String::as_str)));

            rules.push(CompiledPolicyRule {
                name: source,
                priority: rule.priority,
                action,
                domains: builder.build(),
                clients,
            });
        }

        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        info!(rules = rules.len(), "Policy rules compiled");
        Self { rules }
    }
}

fn parse_target(target: &str) -> RedirectTarget {
    match target.parse::<IpAddr>() {
        Ok(addr) => RedirectTarget::Address(addr),
        Err(_) => RedirectTarget::Name(Arc::from(normalize_name(target).as_str())),
    }
}

impl PolicyEngine for RulePolicyEngine {
    fn evaluate(&self, question: &Question, client: &ClientInfo) -> PolicyDecision {
        let name = normalize_name(&question.name);

        for rule in &self.rules {
            if !rule.accepts(&name, client.ip) {
                continue;
            }
            return match &rule.action {
                CompiledAction::Allow => PolicyDecision::Allow,
                CompiledAction::Block => PolicyDecision::Block {
                    rule: Arc::clone(&rule.name),
                },
                CompiledAction::Redirect(target) => PolicyDecision::Redirect {
                    rule: Arc::clone(&rule.name),
                    target: target.clone(),
                },
            };
        }

        PolicyDecision::Passthrough
    }
}
