pub mod block_filter;
pub mod cache;
pub mod codec;
pub mod forwarder;
pub mod kill_switch;
pub mod local_records;
pub mod pipeline;
pub mod policy;
pub mod rules;
pub mod server;
pub mod transport;

pub use block_filter::{BlocklistEngine, ListSnapshot, WhitelistStore};
pub use cache::{AnswerCache, CacheKey, CacheStats, EntryFlags};
pub use forwarder::{BreakerState, CircuitBreaker, UpstreamForwarder, UpstreamPool};
pub use kill_switch::KillSwitches;
pub use local_records::LocalRecordStore;
pub use pipeline::{PipelineBuilder, PipelineOutcome, PipelineRequest, QueryPipeline};
pub use policy::RulePolicyEngine;
pub use rules::RuleEvaluator;
pub use server::DnsServerHandler;
