pub mod metrics;
pub mod policy_engine;
pub mod query_log;
pub mod rate_limit;
pub mod source_loader;

pub use metrics::{MetricsSink, NoopMetrics};
pub use policy_engine::PolicyEngine;
pub use query_log::{NoopQueryLog, QueryLogSink, QuerySummary};
pub use rate_limit::{IngressLimiter, LimiterVerdict, NoopLimiter};
pub use source_loader::{ListSource, ListSourceLoader};
