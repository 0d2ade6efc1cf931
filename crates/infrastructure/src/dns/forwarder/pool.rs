use super::breaker::{BreakerState, CircuitBreaker};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use warden_dns_domain::config::CircuitBreakerConfig;
use warden_dns_domain::ResolveError;

/// One upstream endpoint paired with its circuit breaker.
pub struct Upstream {
    pub addr: SocketAddr,
    /// Normalized `host:port`, shared with logs and trace entries.
    pub display: Arc<str>,
    pub breaker: CircuitBreaker,
}

/// The default upstream set with an atomic round-robin cursor.
pub struct UpstreamPool {
    upstreams: Vec<Upstream>,
    cursor: AtomicUsize,
}

impl UpstreamPool {
    pub fn new(
        addresses: &[String],
        breaker_config: CircuitBreakerConfig,
    ) -> Result<Self, ResolveError> {
        if addresses.is_empty() {
            return Err(ResolveError::Internal(
                "upstream pool requires at least one server".into(),
            ));
        }

        let mut upstreams = Vec::with_capacity(addresses.len());
        for address in addresses {
            let addr: SocketAddr = address.parse().map_err(|e| {
                ResolveError::Internal(format!("invalid upstream '{}': {}", address, e))
            })?;
            let display: Arc<str> = Arc::from(addr.to_string().as_str());
            upstreams.push(Upstream {
                addr,
                display: Arc::clone(&display),
                breaker: CircuitBreaker::new(display, breaker_config),
            });
        }

        Ok(Self {
            upstreams,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    /// Next upstream in round-robin order, regardless of health. The
    /// forwarder filters by breaker admission per attempt.
    pub fn next(&self) -> &Upstream {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.upstreams.len();
        &self.upstreams[index]
    }

    /// True when at least one breaker is not Open.
    pub fn any_healthy(&self) -> bool {
        self.upstreams
            .iter()
            .any(|u| u.breaker.state() != BreakerState::Open)
    }
}
