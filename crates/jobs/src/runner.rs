use crate::{BlocklistUpdateJob, CacheSweepJob, KillSwitchWatchJob};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Register jobs with the builder methods, then call `start` once; every
/// job winds down through the shared cancellation token.
pub struct JobRunner {
    blocklist_update: Option<BlocklistUpdateJob>,
    cache_sweep: Option<CacheSweepJob>,
    kill_switch_watch: Option<KillSwitchWatchJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            blocklist_update: None,
            cache_sweep: None,
            kill_switch_watch: None,
        }
    }

    pub fn with_blocklist_update(mut self, job: BlocklistUpdateJob) -> Self {
        self.blocklist_update = Some(job);
        self
    }

    pub fn with_cache_sweep(mut self, job: CacheSweepJob) -> Self {
        self.cache_sweep = Some(job);
        self
    }

    pub fn with_kill_switch_watch(mut self, job: KillSwitchWatchJob) -> Self {
        self.kill_switch_watch = Some(job);
        self
    }

    /// Start all registered background jobs.
    pub fn start(self, cancel: CancellationToken) {
        info!("Starting background job runner");

        if let Some(job) = self.blocklist_update {
            Arc::new(job).start(cancel.child_token());
        }
        if let Some(job) = self.cache_sweep {
            Arc::new(job).start(cancel.child_token());
        }
        if let Some(job) = self.kill_switch_watch {
            Arc::new(job).start(cancel.child_token());
        }

        info!("All background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
