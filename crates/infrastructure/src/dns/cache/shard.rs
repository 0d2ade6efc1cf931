use super::entry::CacheEntry;
use super::key::CacheKey;
use super::stats::CacheStats;
use hickory_proto::op::Message;
use lru::LruCache;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::num::NonZeroUsize;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use warden_dns_domain::ResolveError;

/// What a completed singleflight fetch hands to every waiter.
#[derive(Debug, Clone)]
pub struct SharedResponse {
    pub message: Arc<Message>,
    /// `host:port` the answer came from, for trace attribution.
    pub server: Arc<str>,
}

/// Result shared between a singleflight leader and its followers.
pub type FlightResult = Result<SharedResponse, ResolveError>;

type FlightReceiver = watch::Receiver<Option<FlightResult>>;

/// One cache partition: an LRU map plus the in-flight rendezvous map, both
/// behind the same mutex.
pub struct CacheShard {
    inner: Mutex<ShardInner>,
    stats: Arc<CacheStats>,
}

struct ShardInner {
    entries: LruCache<CacheKey, CacheEntry, FxBuildHasher>,
    inflight: FxHashMap<CacheKey, FlightReceiver>,
}

/// Outcome of `begin_flight`: the first miss leads, late arrivals follow.
pub enum Flight {
    Leader(FlightGuard),
    Follower(FlightReceiver),
}

/// Held by the singleflight leader. `complete` publishes the result and
/// clears the rendezvous; dropping without completing publishes an internal
/// error so followers never hang, whatever path the leader exited through.
pub struct FlightGuard {
    shard: Arc<CacheShard>,
    key: CacheKey,
    tx: watch::Sender<Option<FlightResult>>,
    done: bool,
}

impl FlightGuard {
    pub fn subscribe(&self) -> FlightReceiver {
        self.tx.subscribe()
    }

    pub fn complete(mut self, result: FlightResult) {
        let _ = self.tx.send(Some(result));
        self.shard.remove_inflight(&self.key);
        self.done = true;
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.tx.send(Some(Err(ResolveError::Internal(
                "in-flight fetch abandoned".into(),
            ))));
            self.shard.remove_inflight(&self.key);
        }
    }
}

impl CacheShard {
    pub fn new(capacity: usize, stats: Arc<CacheStats>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(ShardInner {
                entries: LruCache::with_hasher(capacity, FxBuildHasher),
                inflight: FxHashMap::default(),
            }),
            stats,
        }
    }

    /// Non-expired hit: touch LRU, clone with decayed TTLs. Expired entries
    /// are removed on sight and count as misses.
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<Message> {
        let mut inner = self.inner.lock().unwrap();

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let response = entry.response_at(now);
                self.stats.record_hit();
                return Some(response);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(entry) = inner.entries.pop(key) {
                self.stats
                    .bytes_approx
                    .fetch_sub(entry.approx_size(), Ordering::Relaxed);
                self.stats.expired_removals.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.stats.record_miss();
        None
    }

    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        let size = entry.approx_size();
        let mut inner = self.inner.lock().unwrap();

        if let Some((evicted_key, evicted)) = inner.entries.push(key.clone(), entry) {
            self.stats
                .bytes_approx
                .fetch_sub(evicted.approx_size(), Ordering::Relaxed);
            if evicted_key != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.stats.bytes_approx.fetch_add(size, Ordering::Relaxed);
        self.stats.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Join an in-flight fetch for `key`, or become its leader.
    pub fn begin_flight(self: &Arc<Self>, key: &CacheKey) -> Flight {
        let mut inner = self.inner.lock().unwrap();

        if let Some(rx) = inner.inflight.get(key) {
            return Flight::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        inner.inflight.insert(key.clone(), rx);
        Flight::Leader(FlightGuard {
            shard: Arc::clone(self),
            key: key.clone(),
            tx,
            done: false,
        })
    }

    fn remove_inflight(&self, key: &CacheKey) {
        let mut inner = self.inner.lock().unwrap();
        inner.inflight.remove(key);
    }

    /// Delete entries matching `predicate`. Keys are snapshot under the lock
    /// first, then removed, so the LRU list is never mutated mid-iteration.
    pub fn remove_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CacheEntry) -> bool,
    {
        let mut inner = self.inner.lock().unwrap();
        let doomed: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0;
        for key in doomed {
            if let Some(entry) = inner.entries.pop(&key) {
                self.stats
                    .bytes_approx
                    .fetch_sub(entry.approx_size(), Ordering::Relaxed);
                removed += 1;
            }
        }
        removed
    }

    pub fn clear(&self) -> usize {
        self.remove_matching(|_| true)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }
}
