use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use warden_dns_infrastructure::dns::AnswerCache;

/// Amortized expiry sweeper. Lookups already treat expired entries as
/// misses; this job just bounds memory between lookups.
pub struct CacheSweepJob {
    cache: Arc<AnswerCache>,
    interval: Duration,
}

impl CacheSweepJob {
    pub fn new(cache: Arc<AnswerCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    pub fn run_once(&self) -> usize {
        self.cache.sweep_expired()
    }

    pub fn start(self: Arc<Self>, cancel: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.tick().await; // skip the immediate tick; nothing expires at boot
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Cache sweep job stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = self.run_once();
                        if removed > 0 {
                            debug!(removed, "Cache sweep removed expired entries");
                        }
                    }
                }
            }
        });
    }
}
