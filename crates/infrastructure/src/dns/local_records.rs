//! Authoritative overlay: small sets of records answered directly, without
//! consulting cache or upstream. Compiled from config into an immutable
//! index behind an `ArcSwap`.

use arc_swap::ArcSwap;
use compact_str::CompactString;
use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, PTR, SRV, TXT};
use hickory_proto::rr::{Name, RData, Record};
use rustc_hash::FxHashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use warden_dns_domain::config::LocalRecordConfig;
use warden_dns_domain::{normalize_name, RecordType};

/// Typed payload of one overlay record.
#[derive(Debug, Clone)]
enum LocalPayload {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(Arc<str>),
    Mx { preference: u16, exchange: Arc<str> },
    Srv { priority: u16, weight: u16, port: u16, target: Arc<str> },
    Txt(Vec<String>),
    Ptr(Arc<str>),
}

impl LocalPayload {
    fn record_type(&self) -> RecordType {
        match self {
            LocalPayload::A(_) => RecordType::A,
            LocalPayload::Aaaa(_) => RecordType::Aaaa,
            LocalPayload::Cname(_) => RecordType::Cname,
            LocalPayload::Mx { .. } => RecordType::Mx,
            LocalPayload::Srv { .. } => RecordType::Srv,
            LocalPayload::Txt(_) => RecordType::Txt,
            LocalPayload::Ptr(_) => RecordType::Ptr,
        }
    }

    fn to_rdata(&self) -> Result<RData, String> {
        let parse_name = |s: &str| {
            Name::from_str(&format!("{}.", s)).map_err(|e| format!("bad name '{}': {}", s, e))
        };

        Ok(match self {
            LocalPayload::A(addr) => RData::A(A(*addr)),
            LocalPayload::Aaaa(addr) => RData::AAAA(AAAA(*addr)),
            LocalPayload::Cname(target) => RData::CNAME(CNAME(parse_name(target)?)),
            LocalPayload::Mx { preference, exchange } => {
                RData::MX(MX::new(*preference, parse_name(exchange)?))
            }
            LocalPayload::Srv { priority, weight, port, target } => {
                RData::SRV(SRV::new(*priority, *weight, *port, parse_name(target)?))
            }
            LocalPayload::Txt(strings) => RData::TXT(TXT::new(strings.clone())),
            LocalPayload::Ptr(target) => RData::PTR(PTR(parse_name(target)?)),
        })
    }
}

#[derive(Debug, Clone)]
struct LocalRecord {
    payload: LocalPayload,
    ttl: u32,
}

impl LocalRecord {
    fn to_record(&self, owner: &Name) -> Option<Record> {
        match self.payload.to_rdata() {
            Ok(rdata) => Some(Record::from_rdata(owner.clone(), self.ttl, rdata)),
            Err(e) => {
                warn!(error = %e, "Unrenderable local record payload");
                None
            }
        }
    }
}

struct WildcardEntry {
    /// `".lab.lan"` for owner `*.lab.lan`; matches exactly one extra label.
    suffix: CompactString,
    records: Vec<LocalRecord>,
}

#[derive(Default)]
struct LocalIndex {
    exact: FxHashMap<CompactString, Vec<LocalRecord>>,
    wildcards: Vec<WildcardEntry>,
}

/// What a lookup produced.
pub enum LocalLookup {
    /// Records matching the queried type.
    Records(Vec<Record>),
    /// A CNAME at the owner; the pipeline follows the alias (locally first,
    /// then through cache/upstream).
    Alias { record: Record, target: Arc<str> },
}

pub struct LocalRecordStore {
    snapshot: ArcSwap<LocalIndex>,
}

impl LocalRecordStore {
    pub fn new(configs: &[LocalRecordConfig]) -> Self {
        let store = Self {
            snapshot: ArcSwap::from_pointee(LocalIndex::default()),
        };
        store.rebuild(configs);
        store
    }

    pub fn rebuild(&self, configs: &[LocalRecordConfig]) {
        let mut index = LocalIndex::default();
        let mut loaded = 0usize;

        for config in configs.iter().filter(|c| c.enabled) {
            let payload = match parse_payload(config) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(record = %config.name, error = %e, "Skipping invalid local record");
                    continue;
                }
            };

            let record = LocalRecord {
                payload,
                ttl: config.ttl,
            };

            let owner = normalize_name(&config.name);
            if config.wildcard || owner.starts_with("*.") {
                let stem = owner.strip_prefix("*.").unwrap_or(&owner);
                let suffix = format!(".{}", stem);
                if let Some(entry) = index
                    .wildcards
                    .iter_mut()
                    .find(|w| w.suffix.as_str() == suffix)
                {
                    entry.records.push(record);
                } else {
                    index.wildcards.push(WildcardEntry {
                        suffix: CompactString::new(suffix),
                        records: vec![record],
                    });
                }
            } else {
                index.exact.entry(CompactString::new(owner)).or_default().push(record);
            }
            loaded += 1;
        }

        info!(records = loaded, "Local records compiled");
        self.snapshot.store(Arc::new(index));
    }

    /// Exact owner first, then wildcard entries. Type must match exactly,
    /// except a CNAME matches any query type on that owner.
    pub fn lookup(&self, name: &str, qtype: RecordType) -> Option<LocalLookup> {
        let normalized = normalize_name(name);
        let index = self.snapshot.load();

        let records = index
            .exact
            .get(normalized.as_str())
            .or_else(|| {
                index
                    .wildcards
                    .iter()
                    .find(|w| wildcard_matches(&normalized, &w.suffix))
                    .map(|w| &w.records)
            })?;

        let owner = Name::from_str(&format!("{}.", normalized)).ok()?;

        let typed: Vec<Record> = records
            .iter()
            .filter(|r| r.payload.record_type() == qtype)
            .filter_map(|r| r.to_record(&owner))
            .collect();
        if !typed.is_empty() {
            return Some(LocalLookup::Records(typed));
        }

        records
            .iter()
            .find(|r| matches!(r.payload, LocalPayload::Cname(_)))
            .and_then(|r| {
                let target = match &r.payload {
                    LocalPayload::Cname(target) => Arc::clone(target),
                    _ => unreachable!(),
                };
                r.to_record(&owner)
                    .map(|record| LocalLookup::Alias { record, target })
            })
    }

    pub fn len(&self) -> usize {
        let index = self.snapshot.load();
        index.exact.values().map(Vec::len).sum::<usize>()
            + index.wildcards.iter().map(|w| w.records.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `*.foo.bar` matches `x.foo.bar` for any single label `x`, not `foo.bar`
/// itself and not deeper subdomains.
fn wildcard_matches(name: &str, suffix: &str) -> bool {
    match name.strip_suffix(suffix) {
        Some(label) => !label.is_empty() && !label.contains('.'),
        None => false,
    }
}

fn parse_payload(config: &LocalRecordConfig) -> Result<LocalPayload, String> {
    let record_type = RecordType::from_str(&config.record_type)?;
    let value = config.value.trim();

    match record_type {
        RecordType::A => value
            .parse::<Ipv4Addr>()
            .map(LocalPayload::A)
            .map_err(|e| format!("bad A payload '{}': {}", value, e)),
        RecordType::Aaaa => value
            .parse::<Ipv6Addr>()
            .map(LocalPayload::Aaaa)
            .map_err(|e| format!("bad AAAA payload '{}': {}", value, e)),
        RecordType::Cname => Ok(LocalPayload::Cname(Arc::from(normalize_name(value).as_str()))),
        RecordType::Ptr => Ok(LocalPayload::Ptr(Arc::from(normalize_name(value).as_str()))),
        RecordType::Mx => {
            let (preference, exchange) = value
                .split_once(char::is_whitespace)
                .ok_or_else(|| format!("MX payload '{}' needs 'preference exchange'", value))?;
            Ok(LocalPayload::Mx {
                preference: preference
                    .parse()
                    .map_err(|e| format!("bad MX preference: {}", e))?,
                exchange: Arc::from(normalize_name(exchange.trim()).as_str()),
            })
        }
        RecordType::Srv => {
            let parts: Vec<&str> = value.split_whitespace().collect();
            if parts.len() != 4 {
                return Err(format!(
                    "SRV payload '{}' needs 'priority weight port target'",
                    value
                ));
            }
            Ok(LocalPayload::Srv {
                priority: parts[0].parse().map_err(|e| format!("bad SRV priority: {}", e))?,
                weight: parts[1].parse().map_err(|e| format!("bad SRV weight: {}", e))?,
                port: parts[2].parse().map_err(|e| format!("bad SRV port: {}", e))?,
                target: Arc::from(normalize_name(parts[3]).as_str()),
            })
        }
        RecordType::Txt => Ok(LocalPayload::Txt(vec![value.to_string()])),
        other => Err(format!("unsupported local record type {}", other)),
    }
}
