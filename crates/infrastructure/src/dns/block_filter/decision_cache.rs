use super::snapshot::ListMatch;
use compact_str::CompactString;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::time::{Duration, Instant};

/// TTL on cached verdicts; bounds staleness for threads that raced a swap.
const DECISION_TTL: Duration = Duration::from_secs(60);

/// Shared verdict cache in front of the snapshot walk.
///
/// Caches the full `Option<ListMatch>` so a repeated blocked name skips the
/// wildcard/regex scan without losing pattern attribution for the trace.
/// Cleared after every snapshot swap.
pub struct BlockDecisionCache {
    decisions: DashMap<CompactString, (Option<ListMatch>, Instant), FxBuildHasher>,
}

impl BlockDecisionCache {
    pub fn new() -> Self {
        Self {
            decisions: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn get(&self, name: &str) -> Option<Option<ListMatch>> {
        let entry = self.decisions.get(name)?;
        let (verdict, cached_at) = entry.value();
        if cached_at.elapsed() > DECISION_TTL {
            drop(entry);
            self.decisions.remove(name);
            return None;
        }
        Some(verdict.clone())
    }

    pub fn set(&self, name: &str, verdict: Option<ListMatch>) {
        self.decisions
            .insert(CompactString::new(name), (verdict, Instant::now()));
    }

    pub fn clear(&self) {
        self.decisions.clear();
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

impl Default for BlockDecisionCache {
    fn default() -> Self {
        Self::new()
    }
}
