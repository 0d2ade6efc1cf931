//! Warden DNS application layer: the ports the core pipeline requires from
//! its peripheral collaborators.
pub mod ports;

pub use ports::{
    IngressLimiter, LimiterVerdict, ListSource, ListSourceLoader, MetricsSink, NoopLimiter,
    NoopMetrics, NoopQueryLog, PolicyEngine, QueryLogSink, QuerySummary,
};
