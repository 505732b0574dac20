//! Circuit breaker for storage backends with external dependencies.
//!
//! After a run of consecutive failures the circuit opens and calls fail
//! fast without touching the backend. Once the cool-down elapses a limited
//! number of probe calls are let through; enough successes close the
//! circuit again, a single failure re-opens it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through normally.
    Closed,
    /// Calls are rejected until `until`.
    Open { until: Instant },
    /// Probe calls are allowed through to test recovery.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open { .. } => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Thresholds and timing for a [`CircuitBreaker`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing probes.
    pub cooldown: Duration,
    /// Consecutive half-open successes required to close the circuit.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            half_open_success_threshold: 2,
        }
    }
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    config: CircuitBreakerConfig,
}

/// Thread-safe circuit breaker.
///
/// State lives behind a mutex with short critical sections; no I/O happens
/// under the lock. Cloning shares the same breaker.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    /// Create a breaker named after the operation it guards.
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                config,
            })),
        }
    }

    /// Whether a call may proceed. An open circuit whose cool-down has
    /// elapsed transitions to half-open and admits the call as a probe.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open { until } => {
                if Instant::now() >= until {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                    tracing::info!(operation = self.name, "circuit half-open, probing backend");
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    /// Record a successful call, possibly closing the circuit.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= inner.config.half_open_success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.half_open_successes = 0;
                    tracing::info!(operation = self.name, "circuit closed after successful probes");
                }
            }
            // No calls are admitted while open; ignore stragglers.
            CircuitState::Open { .. } => {}
        }
    }

    /// Record a failed call, possibly opening the circuit.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= inner.config.failure_threshold {
                    let until = Instant::now() + inner.config.cooldown;
                    inner.state = CircuitState::Open { until };
                    tracing::warn!(
                        operation = self.name,
                        consecutive_failures = inner.consecutive_failures,
                        cooldown_secs = inner.config.cooldown.as_secs(),
                        "circuit opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                let until = Instant::now() + inner.config.cooldown;
                inner.state = CircuitState::Open { until };
                inner.half_open_successes = 0;
                tracing::warn!(operation = self.name, "probe failed, circuit re-opened");
            }
            CircuitState::Open { .. } => {}
        }
    }

    /// Current state. Read-only: an expired open circuit is reported as
    /// half-open without transitioning.
    pub fn state(&self) -> CircuitState {
        let inner = self.inner.lock();
        match inner.state {
            CircuitState::Open { until } if Instant::now() >= until => CircuitState::HalfOpen,
            other => other,
        }
    }
}
