use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pipeline stage a trace entry was emitted from.
///
/// Variant order is the order the pipeline visits stages; the trace
/// invariant (entries in non-decreasing stage order) leans on `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Whitelist,
    Blocklist,
    Policy,
    Local,
    Cache,
    ConditionalForward,
    Upstream,
    Response,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Whitelist => "whitelist",
            Stage::Blocklist => "blocklist",
            Stage::Policy => "policy",
            Stage::Local => "local",
            Stage::Cache => "cache",
            Stage::ConditionalForward => "conditional-forward",
            Stage::Upstream => "upstream",
            Stage::Response => "response",
        };
        f.write_str(s)
    }
}

/// Decision taken at a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAction {
    Allow,
    Block,
    Redirect,
    Hit,
    Miss,
    Forward,
    Error,
    Synthesize,
}

impl fmt::Display for TraceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceAction::Allow => "allow",
            TraceAction::Block => "block",
            TraceAction::Redirect => "redirect",
            TraceAction::Hit => "hit",
            TraceAction::Miss => "miss",
            TraceAction::Forward => "forward",
            TraceAction::Error => "error",
            TraceAction::Synthesize => "synthesize",
        };
        f.write_str(s)
    }
}

/// One decision point: `(stage, action, rule, source, elapsed)`.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub stage: Stage,
    pub action: TraceAction,
    /// Identifier of the rule/pattern that fired, if any.
    pub rule: Option<Arc<str>>,
    /// Where the decision came from (list source, upstream address, "timeout").
    pub source: Option<Arc<str>>,
    pub elapsed: Duration,
}

/// Append-only, request-scoped trace. Entries are emitted in stage order
/// and never reordered.
#[derive(Debug)]
pub struct QueryTrace {
    started: Instant,
    entries: Vec<TraceEntry>,
}

impl QueryTrace {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::with_capacity(4),
        }
    }

    pub fn record(
        &mut self,
        stage: Stage,
        action: TraceAction,
        rule: Option<Arc<str>>,
        source: Option<Arc<str>>,
    ) {
        self.entries.push(TraceEntry {
            stage,
            action,
            rule,
            source,
            elapsed: self.started.elapsed(),
        });
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryTrace {
    fn default() -> Self {
        Self::new()
    }
}
