pub mod entry;
pub mod key;
pub mod shard;
pub mod stats;

pub use entry::{CacheEntry, EntryFlags};
pub use key::CacheKey;
pub use shard::{Flight, FlightGuard, FlightResult, SharedResponse};
pub use stats::{CacheStats, CacheStatsSnapshot};

use hickory_proto::op::Message;
use shard::CacheShard;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use warden_dns_domain::config::CacheConfig;
use warden_dns_domain::ResolveError;

/// Sharded TTL answer cache with per-shard singleflight.
///
/// `hash(fingerprint) & (shards - 1)` picks the shard; each shard owns an
/// independent lock, an LRU list and its in-flight rendezvous map.
pub struct AnswerCache {
    shards: Vec<Arc<CacheShard>>,
    shard_mask: u64,
    min_ttl: u32,
    max_ttl: u32,
    negative_ttl: u32,
    blocked_ttl: u32,
    stats: Arc<CacheStats>,
}

impl AnswerCache {
    pub fn new(config: &CacheConfig) -> Self {
        let shard_count = config.effective_shard_count();
        let per_shard = (config.max_entries / shard_count).max(1);
        let stats = Arc::new(CacheStats::default());

        let shards = (0..shard_count)
            .map(|_| Arc::new(CacheShard::new(per_shard, Arc::clone(&stats))))
            .collect();

        info!(
            shards = shard_count,
            per_shard_capacity = per_shard,
            min_ttl = config.min_ttl,
            max_ttl = config.max_ttl,
            "Answer cache initialized"
        );

        Self {
            shards,
            shard_mask: (shard_count - 1) as u64,
            min_ttl: config.min_ttl,
            max_ttl: config.max_ttl,
            negative_ttl: config.negative_ttl,
            blocked_ttl: config.blocked_ttl,
            stats,
        }
    }

    fn shard(&self, key: &CacheKey) -> &Arc<CacheShard> {
        let index = (key.shard_hash() & self.shard_mask) as usize;
        &self.shards[index]
    }

    pub fn get(&self, key: &CacheKey) -> Option<Message> {
        self.shard(key).get(key, Instant::now())
    }

    /// Store a response. Blocked entries live for `blocked_ttl`, negative
    /// answers for `negative_ttl`, everything else for
    /// `clamp(ttl_hint, min_ttl, max_ttl)`.
    pub fn insert(&self, key: CacheKey, response: Message, ttl_hint: u32, flags: EntryFlags) {
        let effective_ttl = if flags.blocked {
            self.blocked_ttl
        } else if flags.negative {
            self.negative_ttl
        } else {
            ttl_hint.clamp(self.min_ttl, self.max_ttl)
        };

        let entry = CacheEntry::new(response, Instant::now(), effective_ttl, flags);
        self.shard(&key).insert(key, entry);
    }

    /// Coalesce concurrent misses for `key`: the first caller runs `fetch`
    /// on its own task (so a cancelled waiter never cancels the shared
    /// fetch); everyone else awaits the one result.
    ///
    /// `fetch` is responsible for inserting into the cache before it
    /// resolves, so all waiters observe the same entry afterwards.
    pub async fn resolve_shared<F>(&self, key: &CacheKey, fetch: F) -> FlightResult
    where
        F: Future<Output = FlightResult> + Send + 'static,
    {
        let mut rx = match self.shard(key).begin_flight(key) {
            Flight::Follower(rx) => {
                debug!(name = %key.name, "Joining in-flight upstream fetch");
                rx
            }
            Flight::Leader(guard) => {
                let rx = guard.subscribe();
                tokio::spawn(async move {
                    let result = fetch.await;
                    guard.complete(result);
                });
                rx
            }
        };

        loop {
            {
                let state = rx.borrow_and_update();
                if let Some(result) = state.as_ref() {
                    return result.clone();
                }
            }
            if rx.changed().await.is_err() {
                return Err(ResolveError::Internal(
                    "in-flight fetch dropped without a result".into(),
                ));
            }
        }
    }

    pub fn clear(&self) {
        let mut removed = 0;
        for shard in &self.shards {
            removed += shard.clear();
        }
        info!(removed, "Cache cleared");
    }

    /// Drop every entry carrying the blocked flag; called after a blocklist
    /// reload so new lists take effect immediately. Idempotent.
    pub fn clear_blocked(&self) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            removed += shard.remove_matching(|entry| entry.is_blocked());
        }
        if removed > 0 {
            info!(removed, "Dropped cached block decisions");
        }
        removed
    }

    /// Remove expired entries. Amortized housekeeping only; lookups already
    /// treat expired entries as misses.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &self.shards {
            removed += shard.remove_matching(|entry| entry.is_expired(now));
        }
        if removed > 0 {
            debug!(removed, "Swept expired cache entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.len() as u64)
    }
}
