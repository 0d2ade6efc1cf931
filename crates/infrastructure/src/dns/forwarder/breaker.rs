//! Per-upstream circuit breaker.
//!
//! Lock-free: state lives in an `AtomicU8` and every transition is a
//! compare-and-swap, so two racing callers never double-transition.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use warden_dns_domain::config::CircuitBreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BreakerState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl BreakerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => BreakerState::Closed,
            1 => BreakerState::Open,
            _ => BreakerState::HalfOpen,
        }
    }
}

/// Admission decision for one call.
pub enum Admission {
    /// Proceed. Holds the half-open permit when probing.
    Allowed(Option<HalfOpenPermit>),
    /// Fail fast without contacting the upstream.
    Rejected,
}

/// Half-open in-flight slot. Decrements on Drop, so the counter is released
/// on every exit path, early returns and panics included.
pub struct HalfOpenPermit {
    inflight: Arc<AtomicU32>,
}

impl Drop for HalfOpenPermit {
    fn drop(&mut self) {
        self.inflight.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct CircuitBreaker {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
    /// Millis since `epoch` of the last state change.
    last_transition_ms: AtomicU64,
    half_open_inflight: Arc<AtomicU32>,
    config: CircuitBreakerConfig,
    epoch: Instant,
    /// Upstream display name, for logs only.
    upstream: Arc<str>,
}

impl CircuitBreaker {
    pub fn new(upstream: Arc<str>, config: CircuitBreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(BreakerState::Closed as u8),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            last_transition_ms: AtomicU64::new(0),
            half_open_inflight: Arc::new(AtomicU32::new(0)),
            config,
            epoch: Instant::now(),
            upstream,
        }
    }

    pub fn state(&self) -> BreakerState {
        BreakerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn transition(&self, from: BreakerState, to: BreakerState) -> bool {
        let swapped = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if swapped {
            self.consecutive_failures.store(0, Ordering::Release);
            self.consecutive_successes.store(0, Ordering::Release);
            self.last_transition_ms.store(self.now_ms(), Ordering::Release);
            if to == BreakerState::HalfOpen {
                self.half_open_inflight.store(0, Ordering::Release);
            }
            debug!(upstream = %self.upstream, ?from, ?to, "Circuit transition");
        }
        swapped
    }

    /// Gate one call. Open circuits reject until `open_timeout` has elapsed,
    /// then the next caller flips to HalfOpen and probes.
    pub fn try_acquire(&self) -> Admission {
        match self.state() {
            BreakerState::Closed => Admission::Allowed(None),
            BreakerState::Open => {
                let since = self
                    .now_ms()
                    .saturating_sub(self.last_transition_ms.load(Ordering::Acquire));
                if since < self.config.open_timeout_ms {
                    return Admission::Rejected;
                }
                // Whoever wins the CAS probes; losers re-enter as half-open.
                self.transition(BreakerState::Open, BreakerState::HalfOpen);
                self.acquire_half_open()
            }
            BreakerState::HalfOpen => self.acquire_half_open(),
        }
    }

    fn acquire_half_open(&self) -> Admission {
        let previous = self.half_open_inflight.fetch_add(1, Ordering::AcqRel);
        if previous >= self.config.half_open_max_concurrent {
            self.half_open_inflight.fetch_sub(1, Ordering::AcqRel);
            return Admission::Rejected;
        }
        Admission::Allowed(Some(HalfOpenPermit {
            inflight: Arc::clone(&self.half_open_inflight),
        }))
    }

    /// A success anywhere zeroes the failure streak; enough half-open
    /// successes close the circuit.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);

        if self.state() == BreakerState::HalfOpen {
            let successes = self.consecutive_successes.fetch_add(1, Ordering::AcqRel) + 1;
            if successes >= self.config.success_threshold
                && self.transition(BreakerState::HalfOpen, BreakerState::Closed)
            {
                debug!(upstream = %self.upstream, "Circuit closed after recovery");
            }
        }
    }

    /// A transport failure. Does not erase recovery progress in Closed state,
    /// but any half-open failure reopens immediately.
    pub fn record_failure(&self) {
        match self.state() {
            BreakerState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.failure_threshold
                    && self.transition(BreakerState::Closed, BreakerState::Open)
                {
                    warn!(
                        upstream = %self.upstream,
                        failures,
                        "Circuit opened after consecutive failures"
                    );
                }
            }
            BreakerState::HalfOpen => {
                if self.transition(BreakerState::HalfOpen, BreakerState::Open) {
                    warn!(upstream = %self.upstream, "Half-open probe failed; circuit reopened");
                }
            }
            BreakerState::Open => {}
        }
    }
}
