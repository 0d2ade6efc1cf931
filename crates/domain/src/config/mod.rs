//! Configuration structures, organized by concern:
//! - `root`: top-level config + file loading
//! - `server`: listener binding
//! - `dns`: upstream resolution defaults
//! - `cache`: answer cache sizing and TTL policy
//! - `blocking`: blocklist sources and block mode
//! - `forwarding`: conditional forwarding rules
//! - `policies`: policy rules
//! - `local_records`: authoritative overlay entries
//! - `breaker`: per-upstream circuit breaker parameters
//! - `features`: feature flags and kill switches
//! - `logging`: log level/format

pub mod blocking;
pub mod breaker;
pub mod cache;
pub mod dns;
pub mod errors;
pub mod features;
pub mod forwarding;
pub mod local_records;
pub mod logging;
pub mod policies;
pub mod root;
pub mod server;

pub use blocking::{BlockMode, BlockingConfig, BlocklistSource};
pub use breaker::CircuitBreakerConfig;
pub use cache::CacheConfig;
pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use features::{FeaturesConfig, KillSwitchConfig};
pub use forwarding::{ConditionalForwardingConfig, ForwardRuleConfig};
pub use local_records::LocalRecordConfig;
pub use logging::LoggingConfig;
pub use policies::{PoliciesConfig, PolicyRuleConfig};
pub use root::Config;
pub use server::ServerConfig;
