use crate::dns::codec::decay_ttls;
use hickory_proto::op::Message;
use std::time::Instant;

/// Flags stamped on an entry at insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    /// NXDOMAIN/NODATA answer; stored under the negative TTL.
    pub negative: bool,
    /// Synthesized block decision; stored under the blocked TTL and dropped
    /// wholesale after a blocklist reload.
    pub blocked: bool,
}

/// One cached response. Immutable after insertion; readers receive clones.
#[derive(Debug)]
pub struct CacheEntry {
    response: Message,
    inserted: Instant,
    expires: Instant,
    original_ttl: u32,
    flags: EntryFlags,
}

impl CacheEntry {
    pub fn new(response: Message, inserted: Instant, effective_ttl: u32, flags: EntryFlags) -> Self {
        Self {
            response,
            inserted,
            expires: inserted + std::time::Duration::from_secs(u64::from(effective_ttl)),
            original_ttl: effective_ttl,
            flags,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }

    pub fn is_blocked(&self) -> bool {
        self.flags.blocked
    }

    pub fn is_negative(&self) -> bool {
        self.flags.negative
    }

    pub fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    /// Clone the stored response with RR TTLs aged by time-in-cache.
    /// The caller rewrites the message id before sending.
    pub fn response_at(&self, now: Instant) -> Message {
        let mut response = self.response.clone();
        let elapsed = now.saturating_duration_since(self.inserted).as_secs();
        decay_ttls(&mut response, elapsed.min(u64::from(u32::MAX)) as u32);
        response
    }

    /// Rough heap footprint used for the bytes-approx stat.
    pub fn approx_size(&self) -> u64 {
        let records = self.response.answers().len() + self.response.name_servers().len();
        128 + (records as u64) * 64
    }
}
