use std::time::Duration;

/// Metrics port. Implementations must be non-blocking; the pipeline calls
/// these on the hot path.
pub trait MetricsSink: Send + Sync {
    fn incr(&self, counter: &'static str);

    fn incr_by(&self, counter: &'static str, value: u64) {
        for _ in 0..value {
            self.incr(counter);
        }
    }

    fn observe_latency(&self, histogram: &'static str, elapsed: Duration);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn incr(&self, _counter: &'static str) {}

    fn incr_by(&self, _counter: &'static str, _value: u64) {}

    fn observe_latency(&self, _histogram: &'static str, _elapsed: Duration) {}
}
