use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_dns_infrastructure::dns::KillSwitches;

/// Re-enables temporarily suspended stages when their timestamps expire.
///
/// Clearing the timestamp and logging happen together in this single
/// watcher task, so each transition is logged exactly once.
pub struct KillSwitchWatchJob {
    switches: Arc<KillSwitches>,
    interval: Duration,
}

impl KillSwitchWatchJob {
    pub fn new(switches: Arc<KillSwitches>, interval: Duration) -> Self {
        Self { switches, interval }
    }

    pub fn run_once(&self) {
        let now = chrono::Utc::now();

        if let Some(until) = self.switches.blocklist_until() {
            if until <= now {
                self.switches.clear_blocklist();
                info!(disabled_until = %until, "Blocklist stage re-enabled");
            }
        }
        if let Some(until) = self.switches.policies_until() {
            if until <= now {
                self.switches.clear_policies();
                info!(disabled_until = %until, "Policy stage re-enabled");
            }
        }
    }

    pub fn start(self: Arc<Self>, cancel: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Kill-switch watcher stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_once();
                    }
                }
            }
        });
    }
}
