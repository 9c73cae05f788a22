//! Circuit Breaker Module
//!
//! Fault isolation for the external readings dependency: after a run of
//! consecutive failures, calls fail fast for a cooldown window instead of
//! hammering a failing provider.

use std::time::{Duration, Instant};

use tracing::{info, warn};

// == Circuit Breaker ==
/// Closed/open breaker without a half-open probing state: the first call
/// after the cooldown elapses is attempted directly and either resets the
/// counter or starts re-counting toward a new trip.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Consecutive failures that trip the breaker
    failure_threshold: u32,
    /// Minimum time the breaker stays open
    cooldown: Duration,
    /// Failures since the last success or cooldown expiry
    consecutive_failures: u32,
    /// Set while open: timestamp of the failure that tripped the breaker
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    // == Constructor ==
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            consecutive_failures: 0,
            opened_at: None,
        }
    }

    // == Check ==
    /// Decides whether a call may proceed at `now`.
    ///
    /// While open and inside the cooldown window, returns the remaining
    /// cooldown as an error. Once the cooldown has elapsed the breaker
    /// closes with a zeroed counter, so a single subsequent failure does not
    /// immediately re-open it.
    pub fn check(&mut self, now: Instant) -> Result<(), Duration> {
        let Some(opened_at) = self.opened_at else {
            return Ok(());
        };
        let elapsed = now.duration_since(opened_at);
        if elapsed < self.cooldown {
            return Err(self.cooldown - elapsed);
        }

        info!("circuit cooldown elapsed, closing");
        self.consecutive_failures = 0;
        self.opened_at = None;
        Ok(())
    }

    // == Record Success ==
    /// Resets the failure counter and closes the circuit.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    // == Record Failure ==
    /// Counts a failure at `now`, opening the circuit once the threshold is
    /// reached.
    pub fn record_failure(&mut self, now: Instant) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.failure_threshold {
            if self.opened_at.is_none() {
                warn!(
                    failures = self.consecutive_failures,
                    "circuit opened after consecutive failures"
                );
            }
            self.opened_at = Some(now);
        }
    }

    // == Inspection ==
    /// True while the breaker is open (cooldown not yet consulted).
    pub fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }

    /// Failures since the last success or cooldown expiry.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(30);

    fn tripped(now: Instant) -> CircuitBreaker {
        let mut breaker = CircuitBreaker::new(3, COOLDOWN);
        for _ in 0..3 {
            breaker.record_failure(now);
        }
        breaker
    }

    #[test]
    fn test_stays_closed_below_threshold() {
        let now = Instant::now();
        let mut breaker = CircuitBreaker::new(3, COOLDOWN);

        breaker.record_failure(now);
        breaker.record_failure(now);

        assert!(!breaker.is_open());
        assert!(breaker.check(now).is_ok());
        assert_eq!(breaker.consecutive_failures(), 2);
    }

    #[test]
    fn test_opens_at_threshold_and_fails_fast() {
        let now = Instant::now();
        let mut breaker = tripped(now);

        assert!(breaker.is_open());
        let retry_after = breaker.check(now).unwrap_err();
        assert_eq!(retry_after, COOLDOWN);
    }

    #[test]
    fn test_remaining_cooldown_shrinks() {
        let now = Instant::now();
        let mut breaker = tripped(now);

        let later = now + Duration::from_secs(10);
        let retry_after = breaker.check(later).unwrap_err();
        assert_eq!(retry_after, Duration::from_secs(20));
    }

    #[test]
    fn test_closes_after_cooldown_with_zeroed_counter() {
        let now = Instant::now();
        let mut breaker = tripped(now);

        let after_cooldown = now + COOLDOWN;
        assert!(breaker.check(after_cooldown).is_ok());
        assert!(!breaker.is_open());
        assert_eq!(breaker.consecutive_failures(), 0);

        // One failure after reopening does not immediately re-trip
        breaker.record_failure(after_cooldown);
        assert!(!breaker.is_open());
        assert!(breaker.check(after_cooldown).is_ok());
    }

    #[test]
    fn test_success_resets_counter() {
        let now = Instant::now();
        let mut breaker = CircuitBreaker::new(3, COOLDOWN);

        breaker.record_failure(now);
        breaker.record_failure(now);
        breaker.record_success();
        assert_eq!(breaker.consecutive_failures(), 0);

        // The run of failures starts over
        breaker.record_failure(now);
        breaker.record_failure(now);
        assert!(!breaker.is_open());
    }
}
