use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use warden_dns_application::MetricsSink;

/// In-process metrics sink: relaxed atomic counters plus sum/count latency
/// accumulators. Lock-free on the hot path; snapshots are for logs and the
/// admin surface.
#[derive(Default)]
pub struct AtomicMetrics {
    counters: DashMap<&'static str, AtomicU64, FxBuildHasher>,
    latency_sums_us: DashMap<&'static str, (AtomicU64, AtomicU64), FxBuildHasher>,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &'static str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Mean latency observed for `name`, if anything was recorded.
    pub fn mean_latency(&self, name: &'static str) -> Option<Duration> {
        let entry = self.latency_sums_us.get(name)?;
        let (sum, count) = entry.value();
        let count = count.load(Ordering::Relaxed);
        if count == 0 {
            return None;
        }
        Some(Duration::from_micros(sum.load(Ordering::Relaxed) / count))
    }
}

impl MetricsSink for AtomicMetrics {
    fn incr(&self, counter: &'static str) {
        self.counters
            .entry(counter)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    fn incr_by(&self, counter: &'static str, value: u64) {
        self.counters
            .entry(counter)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    fn observe_latency(&self, histogram: &'static str, elapsed: Duration) {
        let entry = self
            .latency_sums_us
            .entry(histogram)
            .or_insert_with(|| (AtomicU64::new(0), AtomicU64::new(0)));
        let (sum, count) = entry.value();
        sum.fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        count.fetch_add(1, Ordering::Relaxed);
    }
}
