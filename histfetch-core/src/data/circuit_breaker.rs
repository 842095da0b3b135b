//! Circuit breaker for provider rate limiting and IP bans.
//!
//! When the provider returns HTTP 403 (ban) or fails repeatedly, the breaker
//! opens and all further requests are refused until the cooldown expires.
//! The download loop treats a refused request like any other per-symbol
//! failure; an open breaker never aborts a run.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug)]
struct Inner {
    opened_at: Option<Instant>,
    consecutive_failures: u32,
}

/// Cooldown gate in front of the HTTP client.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                opened_at: None,
                consecutive_failures: 0,
            }),
            cooldown,
        }
    }

    /// Default gate for the Yahoo provider: 15-minute cooldown.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }

    /// Check whether requests are currently allowed. An expired cooldown
    /// closes the breaker and resets the failure counter.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.opened_at {
            None => true,
            Some(opened_at) => {
                if opened_at.elapsed() >= self.cooldown {
                    inner.opened_at = None;
                    inner.consecutive_failures = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful request, resetting the failure counter.
    pub fn record_success(&self) {
        self.inner.lock().unwrap().consecutive_failures = 0;
    }

    /// Record a failed request. Opens the breaker once the consecutive
    /// failure count reaches the threshold.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= FAILURE_THRESHOLD {
            inner.opened_at = Some(Instant::now());
        }
    }

    /// Open the breaker immediately (HTTP 403 / ban).
    pub fn trip(&self) {
        self.inner.lock().unwrap().opened_at = Some(Instant::now());
    }

    /// Remaining cooldown, zero when closed.
    pub fn remaining_cooldown(&self) -> Duration {
        let inner = self.inner.lock().unwrap();
        match inner.opened_at {
            None => Duration::ZERO,
            Some(opened_at) => self.cooldown.saturating_sub(opened_at.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        assert!(CircuitBreaker::new(Duration::from_secs(60)).is_allowed());
    }

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_allowed());
        cb.record_failure();
        assert!(!cb.is_allowed());
    }

    #[test]
    fn success_resets_the_counter() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.is_allowed());
    }

    #[test]
    fn trip_opens_immediately() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.trip();
        assert!(!cb.is_allowed());
        assert!(cb.remaining_cooldown() > Duration::ZERO);
    }

    #[test]
    fn closes_after_cooldown() {
        let cb = CircuitBreaker::new(Duration::from_millis(10));
        cb.trip();
        assert!(!cb.is_allowed());
        std::thread::sleep(Duration::from_millis(15));
        assert!(cb.is_allowed());
        // counter was reset on reopen
        cb.record_failure();
        assert!(cb.is_allowed());
    }
}
