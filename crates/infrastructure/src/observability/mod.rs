pub mod metrics;
pub mod query_log;

pub use metrics::AtomicMetrics;
pub use query_log::BufferedQueryLog;
