//! Warden DNS infrastructure layer: the query pipeline and every subsystem
//! it depends on (cache, forwarder, rule evaluator, blocklist matcher,
//! local records, wire codec, server frontend).
pub mod config_store;
pub mod dns;
pub mod observability;
pub mod sources;

pub use config_store::SharedConfig;
