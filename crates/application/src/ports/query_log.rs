use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use warden_dns_domain::{RecordType, TraceEntry, Transport};

/// Everything a log sink needs about one finished query.
#[derive(Debug, Clone)]
pub struct QuerySummary {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub client: IpAddr,
    pub transport: Transport,
    /// Final rcode as wire value.
    pub rcode: u16,
    pub blocked: bool,
    pub cache_hit: bool,
    pub duration: Duration,
    pub trace: Arc<[TraceEntry]>,
}

/// Query log port. Fire-and-forget: implementations buffer and MUST never
/// block the pipeline; dropping a record under pressure is acceptable.
pub trait QueryLogSink: Send + Sync {
    fn record(&self, summary: QuerySummary);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoopQueryLog;

impl QueryLogSink for NoopQueryLog {
    fn record(&self, _summary: QuerySummary) {}
}
