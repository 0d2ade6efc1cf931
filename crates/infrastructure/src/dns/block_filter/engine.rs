use super::decision_cache::BlockDecisionCache;
use super::parser::parse_lines;
use super::snapshot::{ListMatch, ListSnapshot, ListSnapshotBuilder};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use warden_dns_application::{ListSource, ListSourceLoader};
use warden_dns_domain::config::BlockingConfig;
use warden_dns_domain::{normalize_name, ResolveError};

/// Result of one `update()` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub sources_loaded: usize,
    pub sources_failed: usize,
    pub entries: usize,
}

/// Counters surfaced through the stats call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFilterStats {
    pub entries: usize,
    pub exact: usize,
    pub wildcards: usize,
    pub regexes: usize,
    pub updates_ok: u64,
    pub updates_failed: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// The blocklist matcher.
///
/// The compiled snapshot is swapped atomically on `update()`; queries in
/// flight keep reading the snapshot they captured. The decision cache is
/// cleared after every swap so new lists take effect immediately (the
/// answer cache's blocked entries are dropped by the caller).
pub struct BlocklistEngine {
    snapshot: ArcSwap<ListSnapshot>,
    decision_cache: BlockDecisionCache,
    sources: Vec<(Arc<str>, ListSource)>,
    loader: Arc<dyn ListSourceLoader>,
    update_timeout: Duration,
    updates_ok: AtomicU64,
    updates_failed: AtomicU64,
}

impl BlocklistEngine {
    pub fn new(config: &BlockingConfig, loader: Arc<dyn ListSourceLoader>) -> Self {
        let mut sources: Vec<(Arc<str>, ListSource)> = config
            .sources
            .iter()
            .filter(|s| s.enabled)
            .filter_map(|s| {
                let name: Arc<str> = Arc::from(s.name.as_str());
                match (&s.url, &s.path) {
                    (Some(url), _) => Some((name, ListSource::Url(url.clone()))),
                    (None, Some(path)) => Some((name, ListSource::File(path.clone()))),
                    (None, None) => {
                        warn!(source = %s.name, "Blocklist source has neither url nor path; ignoring");
                        None
                    }
                }
            })
            .collect();

        if !config.custom_blocked.is_empty() {
            sources.push((
                Arc::from("custom"),
                ListSource::Inline(config.custom_blocked.clone()),
            ));
        }

        Self {
            snapshot: ArcSwap::from_pointee(ListSnapshot::empty()),
            decision_cache: BlockDecisionCache::new(),
            sources,
            loader,
            update_timeout: Duration::from_secs(config.update_timeout_secs),
            updates_ok: AtomicU64::new(0),
            updates_failed: AtomicU64::new(0),
        }
    }

    /// Match `name` against the active snapshot, via the decision cache.
    pub fn find(&self, name: &str) -> Option<ListMatch> {
        let normalized = normalize_name(name);

        if let Some(cached) = self.decision_cache.get(&normalized) {
            return cached;
        }

        let verdict = self.snapshot.load().find(&normalized);
        self.decision_cache.set(&normalized, verdict.clone());
        verdict
    }

    pub fn is_blocked(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn size(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let snapshot = self.snapshot.load();
        if snapshot.source_count() == 0 {
            None
        } else {
            Some(snapshot.built_at())
        }
    }

    pub fn stats(&self) -> BlockFilterStats {
        let snapshot = self.snapshot.load();
        BlockFilterStats {
            entries: snapshot.len(),
            exact: snapshot.exact_len(),
            wildcards: snapshot.wildcard_len(),
            regexes: snapshot.regex_len(),
            updates_ok: self.updates_ok.load(Ordering::Relaxed),
            updates_failed: self.updates_failed.load(Ordering::Relaxed),
            last_updated: self.last_updated(),
        }
    }

    /// Reload every configured source and swap in a fresh snapshot.
    ///
    /// One failed source does not abort the update as long as any other
    /// succeeded; only a total failure keeps the previous snapshot. After a
    /// successful swap the caller must drop the answer cache's blocked
    /// entries.
    pub async fn update(&self) -> Result<UpdateSummary, ResolveError> {
        let result = tokio::time::timeout(self.update_timeout, self.load_all()).await;

        let summary = match result {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                self.updates_failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Blocklist update failed");
                return Err(e);
            }
            Err(_) => {
                self.updates_failed.fetch_add(1, Ordering::Relaxed);
                let e = ResolveError::SourceLoad {
                    list_source: "<all>".into(),
                    message: format!("update exceeded {:?}", self.update_timeout),
                };
                error!(error = %e, "Blocklist update timed out");
                return Err(e);
            }
        };

        self.updates_ok.fetch_add(1, Ordering::Relaxed);
        Ok(summary)
    }

    async fn load_all(&self) -> Result<UpdateSummary, ResolveError> {
        // Fetch every source concurrently; slow mirrors don't serialize the
        // reload.
        let loads = futures::future::join_all(
            self.sources
                .iter()
                .map(|(name, source)| async move { (name, self.loader.load(source).await) }),
        )
        .await;

        let mut builder = ListSnapshotBuilder::new();
        let mut loaded = 0usize;
        let mut failed = 0usize;
        let mut last_error: Option<ResolveError> = None;

        for (name, result) in loads {
            match result {
                Ok(lines) => {
                    let patterns = parse_lines(lines.iter().map(String::as_str));
                    info!(source = %name, patterns = patterns.len(), "Blocklist source loaded");
                    builder.add_source(name, patterns);
                    loaded += 1;
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "Blocklist source failed; continuing");
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if loaded == 0 {
            if let Some(e) = last_error {
                // Every source failed; keep serving the previous snapshot.
                return Err(e);
            }
        }

        let snapshot = builder.build();
        let entries = snapshot.len();
        self.snapshot.store(Arc::new(snapshot));
        self.decision_cache.clear();

        info!(
            sources_loaded = loaded,
            sources_failed = failed,
            entries,
            "Blocklist snapshot swapped"
        );

        Ok(UpdateSummary {
            sources_loaded: loaded,
            sources_failed: failed,
            entries,
        })
    }
}
