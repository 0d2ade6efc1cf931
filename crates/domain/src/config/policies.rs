use serde::{Deserialize, Serialize};

/// One policy rule. Evaluated by the policy engine in priority order;
/// `action` is one of `allow`, `block`, `redirect`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyRuleConfig {
    pub name: String,

    pub action: String,

    /// Domains the rule applies to; same pattern grammar as blocklists.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Client networks the rule applies to; empty matches all clients.
    #[serde(default)]
    pub client_cidrs: Vec<String>,

    /// Redirect target (IP address or name); required for `redirect`.
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoliciesConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub rules: Vec<PolicyRuleConfig>,
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rules: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}
