use serde::{Deserialize, Serialize};

/// Authoritative overlay entry answered without consulting upstream.
///
/// `value` is the payload in zone-file shape for the record type:
/// - A/AAAA: the address (`192.168.1.10`, `2001:db8::1`)
/// - CNAME/PTR: the target name
/// - MX: `10 mail.home.lan`
/// - SRV: `0 5 5060 sip.home.lan`
/// - TXT: the text (split on whitespace into character strings)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalRecordConfig {
    /// Owner name; `*.lab.lan` (or `wildcard = true`) matches any single
    /// label in place of the leftmost label.
    pub name: String,

    pub record_type: String,

    pub value: String,

    #[serde(default = "default_ttl")]
    pub ttl: u32,

    #[serde(default)]
    pub wildcard: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_ttl() -> u32 {
    300
}

fn default_true() -> bool {
    true
}
