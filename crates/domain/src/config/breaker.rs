use serde::{Deserialize, Serialize};

/// Per-upstream circuit breaker parameters.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive transport failures before the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Consecutive half-open successes before the circuit closes again.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// How long an open circuit rejects before allowing a probe, in ms.
    #[serde(default = "default_open_timeout")]
    pub open_timeout_ms: u64,

    /// Concurrent probes admitted while half-open.
    #[serde(default = "default_half_open_max")]
    pub half_open_max_concurrent: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            open_timeout_ms: default_open_timeout(),
            half_open_max_concurrent: default_half_open_max(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    2
}

fn default_open_timeout() -> u64 {
    30_000
}

fn default_half_open_max() -> u32 {
    2
}
