use std::net::IpAddr;
use std::sync::Arc;

/// Where a policy redirect should point.
#[derive(Debug, Clone)]
pub enum RedirectTarget {
    Address(IpAddr),
    Name(Arc<str>),
}

/// Outcome of policy evaluation for one query. A closed sum: the pipeline
/// matches on it exhaustively.
#[derive(Debug, Clone)]
pub enum PolicyDecision {
    /// Serve normally; later block stages are skipped for this query.
    Allow,
    /// Synthesize a blocked response.
    Block { rule: Arc<str> },
    /// Synthesize an answer pointing at the target.
    Redirect { rule: Arc<str>, target: RedirectTarget },
    /// No opinion; fall through to the next stage.
    Passthrough,
}
