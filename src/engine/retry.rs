//! Retry policy for block waits.
//!
//! The block-wait calls time out routinely while the chain catches up, so
//! timeouts are retried — but with a bounded attempt count and exponential
//! backoff, not an unconditional spin. Classification is the caller's job:
//! only `Timeout` qualifies for another attempt.

use std::time::Duration;

use crate::config::RetrySettings;

/// Bounded exponential-backoff schedule.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        }
    }

    /// Backoff to sleep after the given failed attempt (1-based):
    /// initial × 2^(attempt−1), capped at the configured ceiling.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let backoff = self
            .initial_backoff
            .saturating_mul(1u32 << exponent);
        backoff.min(self.max_backoff)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
