//! Receive-side retry policy
//!
//! A transport fault on the receive queue is retried with exponential
//! backoff up to a bounded attempt count before escalating to a fatal
//! worker stop. The stats sink never retries; it is best-effort by design.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on configured retry attempts
const MAX_ATTEMPTS_CEILING: u32 = 100;
/// Upper bound on any configured backoff
const MAX_BACKOFF_SECONDS: u64 = 300;

/// Bounded exponential backoff policy for receive-queue faults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts before the worker escalates to a fatal stop
    pub max_attempts: u32,
    /// Backoff before the first retry
    pub initial_backoff: Duration,
    /// Cap applied to the grown backoff
    pub max_backoff: Duration,
    /// Growth factor applied per attempt
    pub multiplier: f64,
    /// Jitter fraction in `[0.0, 1.0]` added to each backoff
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Validate the configured bounds
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_CEILING {
            return Err(format!(
                "max_attempts must be in 1..={MAX_ATTEMPTS_CEILING}, got {}",
                self.max_attempts
            ));
        }
        if self.max_backoff.as_secs() > MAX_BACKOFF_SECONDS {
            return Err(format!(
                "max_backoff must not exceed {MAX_BACKOFF_SECONDS}s, got {:?}",
                self.max_backoff
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!("multiplier must be >= 1.0, got {}", self.multiplier));
        }
        if !self.jitter.is_finite() || !(0.0..=1.0).contains(&self.jitter) {
            return Err(format!("jitter must be in 0.0..=1.0, got {}", self.jitter));
        }
        Ok(())
    }

    /// Backoff for the given zero-based attempt, jittered
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);
        let jittered = if self.jitter > 0.0 {
            let factor = rand::thread_rng().gen_range(0.0..self.jitter);
            capped * (1.0 + factor)
        } else {
            capped
        };
        Duration::from_millis(jittered.min(self.max_backoff.as_millis() as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_policy() -> RetryPolicy {
        RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn backoff_grows_then_caps() {
        let policy = flat_policy();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(10), Duration::from_secs(5));
    }

    #[test]
    fn jitter_never_exceeds_the_cap() {
        let policy = RetryPolicy {
            jitter: 1.0,
            ..RetryPolicy::default()
        };
        for attempt in 0..12 {
            assert!(policy.backoff(attempt) <= policy.max_backoff);
        }
    }

    #[test]
    fn validation_rejects_unreasonable_bounds() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        }
        .validate()
        .is_err());
        assert!(RetryPolicy {
            multiplier: 0.5,
            ..RetryPolicy::default()
        }
        .validate()
        .is_err());
        assert!(RetryPolicy {
            jitter: 1.5,
            ..RetryPolicy::default()
        }
        .validate()
        .is_err());
        assert!(RetryPolicy {
            max_backoff: Duration::from_secs(3600),
            ..RetryPolicy::default()
        }
        .validate()
        .is_err());
    }
}
