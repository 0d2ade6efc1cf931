use serde::{Deserialize, Serialize};

/// One conditional-forwarding rule.
///
/// Domains accept exact names, suffix wildcards (`*.corp`), prefix
/// wildcards (`internal.*`) and `/regex/` patterns. Empty matcher lists are
/// wildcards: a rule with no domains, no client CIDRs and no record types
/// matches every query.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwardRuleConfig {
    pub name: String,

    /// Higher priority wins; ties resolve in config order.
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default)]
    pub client_cidrs: Vec<String>,

    #[serde(default)]
    pub record_types: Vec<String>,

    /// Upstreams this rule steers matching queries to, as `host:port`.
    pub upstreams: Vec<String>,

    /// Per-rule exchange timeout; falls back to `dns.query_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Per-rule retry budget; falls back to `dns.retries`.
    #[serde(default)]
    pub retries: Option<usize>,

    /// Fall back to the default upstream pool when every rule upstream fails.
    #[serde(default = "default_true")]
    pub failover: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConditionalForwardingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub rules: Vec<ForwardRuleConfig>,
}

impl Default for ConditionalForwardingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}
