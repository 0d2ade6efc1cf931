use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature flags consulted on every query.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_true")]
    pub blocklist_enabled: bool,

    #[serde(default = "default_true")]
    pub policies_enabled: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            blocklist_enabled: true,
            policies_enabled: true,
        }
    }
}

/// Temporary stage suspensions. A timestamp in the future means the stage
/// is skipped until then; the kill-switch watcher re-enables it and logs
/// the transition exactly once.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct KillSwitchConfig {
    #[serde(default)]
    pub blocklist_until: Option<DateTime<Utc>>,

    #[serde(default)]
    pub policies_until: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}
