use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warden_dns_infrastructure::dns::{AnswerCache, BlocklistEngine};

/// Periodically refreshes blocklist sources and drops cached block
/// decisions so new lists take effect immediately.
pub struct BlocklistUpdateJob {
    engine: Arc<BlocklistEngine>,
    cache: Arc<AnswerCache>,
    interval: Duration,
}

impl BlocklistUpdateJob {
    pub fn new(engine: Arc<BlocklistEngine>, cache: Arc<AnswerCache>, interval: Duration) -> Self {
        Self {
            engine,
            cache,
            interval,
        }
    }

    /// One refresh cycle. Update failures keep the previous snapshot and
    /// never disturb query serving.
    pub async fn run_once(&self) {
        match self.engine.update().await {
            Ok(summary) => {
                let dropped = self.cache.clear_blocked();
                info!(
                    sources_loaded = summary.sources_loaded,
                    sources_failed = summary.sources_failed,
                    entries = summary.entries,
                    cache_dropped = dropped,
                    "Blocklist refreshed"
                );
            }
            Err(e) => {
                warn!(error = %e, "Blocklist refresh failed; keeping previous snapshot");
            }
        }
    }

    pub fn start(self: Arc<Self>, cancel: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The initial compile happened at wiring time; skip the
            // immediate tick and only refresh on the interval.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Blocklist update job stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                }
            }
        });
    }
}
