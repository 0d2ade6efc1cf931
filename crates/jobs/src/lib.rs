//! Warden DNS background jobs: blocklist auto-update, cache sweeping and
//! kill-switch expiry watching.
pub mod blocklist_update;
pub mod cache_sweep;
pub mod kill_switch_watch;
pub mod runner;

pub use blocklist_update::BlocklistUpdateJob;
pub use cache_sweep::CacheSweepJob;
pub use kill_switch_watch::KillSwitchWatchJob;
pub use runner::JobRunner;
