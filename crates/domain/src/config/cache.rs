use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Number of independent shards. Rounded up to a power of two so the
    /// shard index is a mask, not a modulo.
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,

    /// TTL floor in seconds. Upstream TTL 0 is stored for at least this long.
    #[serde(default = "default_min_ttl")]
    pub min_ttl: u32,

    #[serde(default = "default_max_ttl")]
    pub max_ttl: u32,

    /// TTL for NXDOMAIN/NODATA answers.
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl: u32,

    /// TTL for synthesized blocked answers.
    #[serde(default = "default_blocked_ttl")]
    pub blocked_ttl: u32,
}

impl CacheConfig {
    /// Shard count as a power of two, at least 1.
    pub fn effective_shard_count(&self) -> usize {
        self.shard_count.max(1).next_power_of_two()
    }

    /// Sweeper cadence: half the TTL floor, but never below one second.
    pub fn sweep_interval_secs(&self) -> u64 {
        (u64::from(self.min_ttl) / 2).max(1)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            shard_count: default_shard_count(),
            min_ttl: default_min_ttl(),
            max_ttl: default_max_ttl(),
            negative_ttl: default_negative_ttl(),
            blocked_ttl: default_blocked_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    200_000
}

fn default_shard_count() -> usize {
    16
}

fn default_min_ttl() -> u32 {
    60
}

fn default_max_ttl() -> u32 {
    86_400
}

fn default_negative_ttl() -> u32 {
    300
}

fn default_blocked_ttl() -> u32 {
    300
}
