use serde::{Deserialize, Serialize};

/// How a blocked query is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockMode {
    /// A 0.0.0.0 / AAAA :: with the blocked TTL; NODATA for other types.
    ZeroIp,
    /// rcode NXDOMAIN with an empty answer section.
    Nxdomain,
    /// rcode REFUSED.
    Refused,
}

impl Default for BlockMode {
    fn default() -> Self {
        BlockMode::ZeroIp
    }
}

/// One blocklist source: an HTTP(S) URL or a local file, one pattern per
/// line (hosts-file or plain-domain format).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlocklistSource {
    pub name: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Blocklist configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub sources: Vec<BlocklistSource>,

    /// Inline patterns blocked in addition to the sources.
    #[serde(default)]
    pub custom_blocked: Vec<String>,

    #[serde(default = "default_true")]
    pub auto_update: bool,

    /// Seconds between automatic source refreshes.
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    /// Hard cap on one full reload, in seconds.
    #[serde(default = "default_update_timeout")]
    pub update_timeout_secs: u64,

    #[serde(default)]
    pub block_mode: BlockMode,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sources: vec![],
            custom_blocked: vec![],
            auto_update: true,
            update_interval_secs: default_update_interval(),
            update_timeout_secs: default_update_timeout(),
            block_mode: BlockMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_update_interval() -> u64 {
    86_400
}

fn default_update_timeout() -> u64 {
    60
}
