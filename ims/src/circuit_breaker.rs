use crate::config::CircuitBreakerConfig;
use ims_core::Clock;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Circuit breaker state, surfaced for logging and tests rather than kept
/// entirely private.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    outcomes: VecDeque<bool>,
    opened_at: Option<chrono::DateTime<chrono::Utc>>,
    half_open_probes_remaining: u32,
}

/// Guards calls into an external, non-goal collaborator (the durable store
/// or the broker) per spec.md §7's Downstream-Unavailable handling: trips
/// open once the failure rate over a sliding window of recent outcomes
/// crosses `failure_rate_threshold`, refuses calls while open, then admits
/// a bounded number of half-open probes before closing again.
///
/// Grounded in the same small-struct-plus-`thiserror`-error idiom the rest
/// of the calculation core uses for cross-cutting concerns (compare
/// [`ims_core::rate_limit::RateLimiter`]); there is no equivalent in the
/// trading-framework teacher this crate started from, since that codebase
/// has no durable-store/broker boundary of its own.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                outcomes: VecDeque::with_capacity(config.window_size),
                opened_at: None,
                half_open_probes_remaining: 0,
            }),
        }
    }

    fn wait_in_open(&self) -> Duration {
        Duration::from_millis(self.config.wait_in_open_ms)
    }

    /// Whether a call may proceed right now. `Closed` always admits;
    /// `Open` admits only once `wait_in_open_ms` has elapsed, at which
    /// point it transitions to `HalfOpen` and begins spending its probe
    /// budget; `HalfOpen` admits until its probes are exhausted.
    pub fn allow_call(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened_at| self.clock.now() - opened_at)
                    .unwrap_or_default();
                if elapsed >= chrono::Duration::from_std(self.wait_in_open()).unwrap_or_default() {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_probes_remaining = self.config.half_open_probes;
                    inner.half_open_probes_remaining > 0
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => inner.half_open_probes_remaining > 0,
        }
    }

    fn failure_rate(outcomes: &VecDeque<bool>) -> f64 {
        if outcomes.is_empty() {
            return 0.0;
        }
        let failures = outcomes.iter().filter(|&&ok| !ok).count();
        failures as f64 / outcomes.len() as f64
    }

    fn push_outcome(inner: &mut Inner, window_size: usize, ok: bool) {
        if inner.outcomes.len() >= window_size {
            inner.outcomes.pop_front();
        }
        inner.outcomes.push_back(ok);
    }

    /// Record a successful call. Closes the circuit from `HalfOpen`;
    /// no-ops from `Closed`.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        Self::push_outcome(&mut inner, self.config.window_size, true);
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            inner.outcomes.clear();
            inner.opened_at = None;
        }
    }

    /// Record a failed call. Any failure while half-open reopens the
    /// circuit immediately; while closed, the circuit opens once the
    /// window is full and its failure rate crosses the threshold.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        Self::push_outcome(&mut inner, self.config.window_size, false);
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(self.clock.now());
                inner.outcomes.clear();
            }
            CircuitState::Closed => {
                if inner.outcomes.len() >= self.config.window_size
                    && Self::failure_rate(&inner.outcomes) >= self.config.failure_rate_threshold
                {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(self.clock.now());
                    inner.outcomes.clear();
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ims_core::clock::FixedClock;

    fn breaker(clock: Arc<FixedClock>) -> CircuitBreaker {
        CircuitBreaker::new(
            CircuitBreakerConfig {
                window_size: 4,
                failure_rate_threshold: 0.5,
                wait_in_open_ms: 1_000,
                half_open_probes: 2,
            },
            clock,
        )
    }

    #[test]
    fn stays_closed_below_the_failure_rate_threshold() {
        let clock = Arc::new(FixedClock::at(chrono::Utc::now()));
        let breaker = breaker(clock);
        breaker.record_success();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.allow_call());
    }

    #[test]
    fn opens_once_the_window_is_full_and_failure_rate_crosses_threshold() {
        let clock = Arc::new(FixedClock::at(chrono::Utc::now()));
        let breaker = breaker(clock);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_call());
    }

    #[test]
    fn half_opens_after_the_wait_and_closes_on_a_successful_probe() {
        let clock = Arc::new(FixedClock::at(chrono::Utc::now()));
        let breaker = breaker(clock.clone());
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        clock.advance(chrono::Duration::milliseconds(1_001));
        assert!(breaker.allow_call());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn a_failed_probe_reopens_the_circuit() {
        let clock = Arc::new(FixedClock::at(chrono::Utc::now()));
        let breaker = breaker(clock.clone());
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        clock.advance(chrono::Duration::milliseconds(1_001));
        assert!(breaker.allow_call());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
