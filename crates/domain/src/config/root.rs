use super::{
    BlockingConfig, CacheConfig, CircuitBreakerConfig, ConditionalForwardingConfig, ConfigError,
    DnsConfig, FeaturesConfig, KillSwitchConfig, LocalRecordConfig, LoggingConfig, PoliciesConfig,
    ServerConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration snapshot.
///
/// Published behind an atomic pointer; queries capture the pointer once at
/// pipeline entry, so a racing reload never tears a single query's view.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub blocking: BlockingConfig,

    /// Domains exempt from blocklist and policy-block decisions.
    /// Same pattern grammar as blocklist sources.
    #[serde(default)]
    pub whitelist: Vec<String>,

    #[serde(default)]
    pub policies: PoliciesConfig,

    #[serde(default)]
    pub conditional_forwarding: ConditionalForwardingConfig,

    #[serde(default)]
    pub local_records: Vec<LocalRecordConfig>,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub features: FeaturesConfig,

    #[serde(default)]
    pub kill_switches: KillSwitchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::load_from_str(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dns.upstreams.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one upstream must be configured".into(),
            ));
        }
        for rule in &self.conditional_forwarding.rules {
            if rule.enabled && rule.upstreams.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "forwarding rule '{}' has no upstreams",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}
