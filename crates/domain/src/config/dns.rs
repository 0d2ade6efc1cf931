use serde::{Deserialize, Serialize};

/// Upstream resolution defaults. Conditional-forwarding rules may override
/// timeout/retries per rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Default upstream servers as `host:port`.
    #[serde(default = "default_upstreams")]
    pub upstreams: Vec<String>,

    /// Per-upstream exchange timeout in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,

    /// Upper bound on forwarding attempts; clamped to the upstream count.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Whole-pipeline deadline in milliseconds.
    #[serde(default = "default_pipeline_deadline")]
    pub pipeline_deadline_ms: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstreams: default_upstreams(),
            query_timeout_ms: default_query_timeout(),
            retries: default_retries(),
            pipeline_deadline_ms: default_pipeline_deadline(),
        }
    }
}

fn default_upstreams() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_retries() -> usize {
    2
}

fn default_pipeline_deadline() -> u64 {
    5000
}
