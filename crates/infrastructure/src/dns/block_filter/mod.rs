pub mod decision_cache;
pub mod engine;
pub mod parser;
pub mod snapshot;

pub use decision_cache::BlockDecisionCache;
pub use engine::{BlockFilterStats, BlocklistEngine, UpdateSummary};
pub use parser::{parse_list_line, parse_lines, ParsedPattern};
pub use snapshot::{ListMatch, ListSnapshot, ListSnapshotBuilder};

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;
use warden_dns_domain::normalize_name;

/// The whitelist: same snapshot shape as the blocklist, consulted first.
///
/// A whitelisted name — or any ancestor of it — always wins over any block
/// decision. Built from inline config patterns and rebuilt on config
/// reload.
pub struct WhitelistStore {
    snapshot: ArcSwap<ListSnapshot>,
}

impl WhitelistStore {
    pub fn new(patterns: &[String]) -> Self {
        let store = Self {
            snapshot: ArcSwap::from_pointee(ListSnapshot::empty()),
        };
        store.rebuild(patterns);
        store
    }

    pub fn rebuild(&self, patterns: &[String]) {
        let source: Arc<str> = Arc::from("whitelist");
        let parsed = parse_lines(patterns.iter().map(String::as_str));
        let mut builder = ListSnapshotBuilder::new();
        builder.add_source(&source, parsed);
        let snapshot = builder.build();
        info!(entries = snapshot.len(), "Whitelist compiled");
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Match `name` or any of its ancestors. An exact whitelist entry
    /// protects the whole subtree beneath it.
    pub fn find(&self, name: &str) -> Option<ListMatch> {
        let normalized = normalize_name(name);
        let snapshot = self.snapshot.load();

        if let Some(hit) = snapshot.find(&normalized) {
            return Some(hit);
        }

        let mut rest = normalized.as_str();
        while let Some(dot) = rest.find('.') {
            rest = &rest[dot + 1..];
            if let Some(hit) = snapshot.find(rest) {
                return Some(hit);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }
}
