use super::RecordType;
use std::fmt;
use std::sync::Arc;

/// Lowercase a domain name and strip the trailing dot.
///
/// Every name comparison in the resolver happens on this normalized form.
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    trimmed.to_ascii_lowercase()
}

/// Query class. Only IN is served; everything else is rejected with FORMERR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryClass {
    In,
    Other(u16),
}

impl QueryClass {
    pub fn from_u16(code: u16) -> Self {
        match code {
            1 => QueryClass::In,
            other => QueryClass::Other(other),
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            QueryClass::In => 1,
            QueryClass::Other(code) => *code,
        }
    }
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryClass::In => f.write_str("IN"),
            QueryClass::Other(code) => write!(f, "CLASS{}", code),
        }
    }
}

/// Normalized question (name + type + class).
/// Uses `Arc<str>` for zero-cost cloning across pipeline → cache → forwarder.
#[derive(Debug, Clone)]
pub struct Question {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub class: QueryClass,
}

impl Question {
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            name: Arc::from(normalize_name(name).as_str()),
            record_type,
            class: QueryClass::In,
        }
    }
}
