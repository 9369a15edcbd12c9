use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tuning for the failure-tracking breaker
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures required to open the circuit
    pub failure_threshold: u32,
    /// How long an open circuit refuses calls before the next attempt
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(120),
        }
    }
}

/// Mutable breaker state, guarded by the breaker's mutex.
///
/// Invariant: `opened_at` is set iff a cooldown is being enforced (or has
/// elapsed without a call being attempted yet); it is cleared together
/// with `failure_count` when a call succeeds.
#[derive(Debug, Default)]
struct CircuitState {
    failure_count: u32,
    opened_at: Option<Instant>,
}

/// Two-state circuit breaker: Closed and Open, with cooldown expiry.
///
/// There is deliberately no half-open state. Once the cooldown elapses
/// the circuit reports closed, the next call is attempted normally, and
/// its outcome either closes the circuit (success resets everything) or
/// re-opens it (the failure count is still at threshold).
///
/// All transitions are serialized under a single mutex so concurrent
/// failures cannot under- or over-count.
pub struct CircuitBreaker {
    state: Mutex<CircuitState>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            state: Mutex::new(CircuitState::default()),
            config,
        }
    }

    /// Whether the circuit is currently refusing calls
    pub fn is_open(&self) -> bool {
        let state = self.state.lock().unwrap();
        match state.opened_at {
            Some(opened_at) => opened_at.elapsed() < self.config.cooldown,
            None => false,
        }
    }

    /// A call succeeded: reset the failure count and close the circuit
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        state.failure_count = 0;
        state.opened_at = None;
    }

    /// A call failed: count it and open the circuit at the threshold.
    /// Returns true when the circuit is (re-)opened by this failure.
    pub fn record_failure(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.failure_count += 1;
        if state.failure_count >= self.config.failure_threshold {
            state.opened_at = Some(Instant::now());
            true
        } else {
            false
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.state.lock().unwrap().failure_count
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(threshold: u32, cooldown_ms: u64) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: threshold,
            cooldown: Duration::from_millis(cooldown_ms),
        }
    }

    #[test]
    fn starts_closed() {
        let breaker = CircuitBreaker::default();

        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn stays_closed_below_threshold() {
        let breaker = CircuitBreaker::default();

        assert!(!breaker.record_failure());
        assert!(!breaker.record_failure());

        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 2);
    }

    #[test]
    fn opens_at_threshold() {
        let breaker = CircuitBreaker::default();

        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.record_failure());

        assert!(breaker.is_open());
        assert_eq!(breaker.failure_count(), 3);
    }

    #[test]
    fn success_resets_count_and_closes() {
        let breaker = CircuitBreaker::default();

        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.is_open());

        breaker.record_success();

        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn cooldown_elapse_reports_closed() {
        let breaker = CircuitBreaker::new(fast_config(1, 20));

        assert!(breaker.record_failure());
        assert!(breaker.is_open());

        std::thread::sleep(Duration::from_millis(40));

        assert!(!breaker.is_open());
    }

    #[test]
    fn failure_after_cooldown_reopens_immediately() {
        let breaker = CircuitBreaker::new(fast_config(1, 20));

        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(40));
        assert!(!breaker.is_open());

        // Count is still at threshold, so one more failure re-opens
        assert!(breaker.record_failure());
        assert!(breaker.is_open());
    }

    #[test]
    fn threshold_one_opens_on_first_failure() {
        let breaker = CircuitBreaker::new(fast_config(1, 1_000));

        assert!(breaker.record_failure());
        assert!(breaker.is_open());
    }
}
