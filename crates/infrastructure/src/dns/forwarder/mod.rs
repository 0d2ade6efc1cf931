pub mod breaker;
pub mod pool;

pub use breaker::{Admission, BreakerState, CircuitBreaker, HalfOpenPermit};
pub use pool::{Upstream, UpstreamPool};

use crate::dns::codec::serialize_message;
use crate::dns::transport::{DnsExchange, TcpTransport, UdpSocketPool, UdpTransport};
use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use warden_dns_domain::ResolveError;

/// A successful upstream exchange.
pub struct ForwardOutcome {
    pub response: Message,
    /// `host:port` the answer came from.
    pub server: Arc<str>,
    pub latency: Duration,
}

/// Forwards queries to upstream resolvers.
///
/// Selection is round-robin over the pool, gated per upstream by its
/// circuit breaker; retries move to a different upstream each attempt. Any
/// valid DNS response — SERVFAIL and NXDOMAIN included — is returned
/// immediately: those are protocol signals, not transport faults.
pub struct UpstreamForwarder {
    pool: Arc<UpstreamPool>,
    udp: UdpTransport,
    tcp: TcpTransport,
    timeout: Duration,
    retries: usize,
}

impl UpstreamForwarder {
    pub fn new(
        pool: Arc<UpstreamPool>,
        socket_pool: Arc<UdpSocketPool>,
        timeout: Duration,
        retries: usize,
    ) -> Self {
        Self {
            pool,
            udp: UdpTransport::new(socket_pool),
            tcp: TcpTransport::new(),
            timeout,
            retries,
        }
    }

    /// Forward through the default pool.
    pub async fn forward(&self, query: &Message) -> Result<ForwardOutcome, ResolveError> {
        let query_bytes = serialize_message(query)?;
        let budget = self.retries.max(1).min(self.pool.len());

        let mut last_error: Option<ResolveError> = None;
        let mut attempts = 0;

        // Scan at most one full rotation; each admitted attempt consumes
        // retry budget, breaker-rejected upstreams only consume the scan.
        for _ in 0..self.pool.len() {
            if attempts >= budget {
                break;
            }
            let upstream = self.pool.next();

            let _permit = match upstream.breaker.try_acquire() {
                Admission::Allowed(permit) => permit,
                Admission::Rejected => {
                    last_error = Some(ResolveError::CircuitOpen {
                        server: upstream.display.to_string(),
                    });
                    continue;
                }
            };

            attempts += 1;
            let started = Instant::now();
            match self
                .exchange_one(upstream.addr, &upstream.display, &query_bytes)
                .await
            {
                Ok(response) => {
                    upstream.breaker.record_success();
                    return Ok(ForwardOutcome {
                        response,
                        server: Arc::clone(&upstream.display),
                        latency: started.elapsed(),
                    });
                }
                Err(error) => {
                    upstream.breaker.record_failure();
                    warn!(upstream = %upstream.display, error = %error, "Upstream exchange failed");
                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(error) if attempts > 0 => Err(error),
            // Every upstream was rejected at the breaker (or pool exhausted
            // without a single admission).
            _ => Err(ResolveError::NoHealthyUpstreams),
        }
    }

    /// Forward through a caller-supplied upstream list (conditional
    /// forwarding). Bypasses the default pool's breakers; the rule owns its
    /// own timeout and retry budget.
    pub async fn forward_to(
        &self,
        query: &Message,
        upstreams: &[(SocketAddr, Arc<str>)],
        timeout: Option<Duration>,
        retries: Option<usize>,
    ) -> Result<ForwardOutcome, ResolveError> {
        if upstreams.is_empty() {
            return Err(ResolveError::NoHealthyUpstreams);
        }

        let query_bytes = serialize_message(query)?;
        let timeout = timeout.unwrap_or(self.timeout);
        let budget = retries.unwrap_or(self.retries).max(1).min(upstreams.len());

        let mut last_error: Option<ResolveError> = None;
        for (addr, display) in upstreams.iter().take(budget) {
            let started = Instant::now();
            match self
                .exchange_with_timeout(*addr, display, &query_bytes, timeout)
                .await
            {
                Ok(response) => {
                    return Ok(ForwardOutcome {
                        response,
                        server: Arc::clone(display),
                        latency: started.elapsed(),
                    });
                }
                Err(error) => {
                    warn!(upstream = %display, error = %error, "Rule upstream exchange failed");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(ResolveError::NoHealthyUpstreams))
    }

    async fn exchange_one(
        &self,
        addr: SocketAddr,
        display: &Arc<str>,
        query_bytes: &[u8],
    ) -> Result<Message, ResolveError> {
        self.exchange_with_timeout(addr, display, query_bytes, self.timeout)
            .await
    }

    /// UDP first; a truncated response retries once over TCP against the
    /// same upstream.
    async fn exchange_with_timeout(
        &self,
        addr: SocketAddr,
        display: &Arc<str>,
        query_bytes: &[u8],
        timeout: Duration,
    ) -> Result<Message, ResolveError> {
        let udp_bytes = self.udp.exchange(addr, query_bytes, timeout).await?;
        let response = parse_response(addr, &udp_bytes)?;

        if !response.truncated() {
            return Ok(response);
        }

        debug!(upstream = %display, "Truncated UDP response; retrying over TCP");
        let tcp_bytes = self.tcp.exchange(addr, query_bytes, timeout).await?;
        parse_response(addr, &tcp_bytes)
    }
}

fn parse_response(addr: SocketAddr, bytes: &[u8]) -> Result<Message, ResolveError> {
    Message::from_vec(bytes).map_err(|e| ResolveError::UpstreamNetwork {
        server: addr.to_string(),
        message: format!("unparseable response: {}", e),
    })
}
