//! Temporary stage suspensions ("kill switches").
//!
//! Each switch is an epoch-millisecond timestamp in an atomic; a value in
//! the future means the stage is skipped. Zero means not suspended. The
//! kill-switch watcher job observes expiries and logs each re-enable once.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use warden_dns_domain::config::KillSwitchConfig;

pub struct KillSwitches {
    blocklist_until_ms: AtomicU64,
    policies_until_ms: AtomicU64,
}

impl KillSwitches {
    pub fn new() -> Self {
        Self {
            blocklist_until_ms: AtomicU64::new(0),
            policies_until_ms: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &KillSwitchConfig) -> Self {
        let switches = Self::new();
        if let Some(until) = config.blocklist_until {
            switches.suspend_blocklist_until(until);
        }
        if let Some(until) = config.policies_until {
            switches.suspend_policies_until(until);
        }
        switches
    }

    fn now_ms() -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }

    pub fn blocklist_suspended(&self) -> bool {
        Self::now_ms() < self.blocklist_until_ms.load(Ordering::Acquire)
    }

    pub fn policies_suspended(&self) -> bool {
        Self::now_ms() < self.policies_until_ms.load(Ordering::Acquire)
    }

    pub fn suspend_blocklist_until(&self, until: DateTime<Utc>) {
        self.blocklist_until_ms
            .store(until.timestamp_millis().max(0) as u64, Ordering::Release);
    }

    pub fn suspend_policies_until(&self, until: DateTime<Utc>) {
        self.policies_until_ms
            .store(until.timestamp_millis().max(0) as u64, Ordering::Release);
    }

    pub fn blocklist_until(&self) -> Option<DateTime<Utc>> {
        timestamp(self.blocklist_until_ms.load(Ordering::Acquire))
    }

    pub fn policies_until(&self) -> Option<DateTime<Utc>> {
        timestamp(self.policies_until_ms.load(Ordering::Acquire))
    }

    pub fn clear_blocklist(&self) {
        self.blocklist_until_ms.store(0, Ordering::Release);
    }

    pub fn clear_policies(&self) {
        self.policies_until_ms.store(0, Ordering::Release);
    }
}

impl Default for KillSwitches {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp(ms: u64) -> Option<DateTime<Utc>> {
    if ms == 0 {
        None
    } else {
        Utc.timestamp_millis_opt(ms as i64).single()
    }
}
