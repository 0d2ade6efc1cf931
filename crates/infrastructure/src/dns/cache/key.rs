use compact_str::CompactString;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use warden_dns_domain::{QueryClass, Question, RecordType};

/// Cache fingerprint: `(lowercased name, qtype, qclass, DO bit)`.
///
/// The DO bit is part of the identity because upstream answers differ when
/// DNSSEC records are requested; the resolver passes them through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: CompactString,
    pub record_type: RecordType,
    pub class: QueryClass,
    pub dnssec_ok: bool,
}

impl CacheKey {
    pub fn new(question: &Question, dnssec_ok: bool) -> Self {
        Self {
            name: CompactString::new(&*question.name),
            record_type: question.record_type,
            class: question.class,
            dnssec_ok,
        }
    }

    /// Shard selector; the caller masks with `shard_count - 1`.
    pub fn shard_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
