use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use warden_dns_application::{QueryLogSink, QuerySummary};

/// Buffered query log that drains to structured `tracing` output.
///
/// `record` is a bounded `try_send`: when the drain task falls behind, new
/// records are dropped and counted instead of ever blocking a query.
pub struct BufferedQueryLog {
    tx: mpsc::Sender<QuerySummary>,
    dropped: AtomicU64,
}

impl BufferedQueryLog {
    /// Spawn the drain task and return the sink.
    pub fn spawn(capacity: usize) -> Arc<Self> {
        let (tx, mut rx) = mpsc::channel::<QuerySummary>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(summary) = rx.recv().await {
                info!(
                    target: "warden_dns::query",
                    domain = %summary.name,
                    record_type = %summary.record_type,
                    client = %summary.client,
                    transport = %summary.transport,
                    rcode = summary.rcode,
                    blocked = summary.blocked,
                    cache_hit = summary.cache_hit,
                    duration_us = summary.duration.as_micros() as u64,
                    stages = summary.trace.len(),
                    "query"
                );
            }
        });

        Arc::new(Self {
            tx,
            dropped: AtomicU64::new(0),
        })
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl QueryLogSink for BufferedQueryLog {
    fn record(&self, summary: QuerySummary) {
        if self.tx.try_send(summary).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}
