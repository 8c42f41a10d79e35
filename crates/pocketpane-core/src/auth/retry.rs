use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Delay after the first failed call.
/// The pane refreshes every few seconds; 2s keeps a transient failure cheap.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 2_000;

/// Upper bound on the delay between attempts.
/// Approval happens at human pace, so a minute between checks is still responsive.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

/// Hard ceiling on any configured delay (one day)
const MAX_DELAY_MS: u64 = 24 * 60 * 60 * 1_000;

/// How failed network calls are paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Consecutive failures tolerated before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Retry on the very next tick, forever.
    pub fn immediate() -> Self {
        Self {
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            max_attempts: None,
        }
    }

    /// Delay to wait after `failures` consecutive failures (doubling, capped).
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (failures - 1).min(63);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms.max(self.initial_backoff_ms))
            .min(MAX_DELAY_MS);
        Duration::from_millis(ms)
    }
}

/// Consecutive-failure bookkeeping for the authorization flow.
#[derive(Debug, Clone, Default)]
pub struct Backoff {
    failures: u32,
    retry_at: Option<Instant>,
}

impl Backoff {
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Whether a network call may be made at `now`
    pub fn ready(&self, now: Instant) -> bool {
        self.retry_at.map_or(true, |at| now >= at)
    }

    /// Time left until the next attempt is allowed
    pub fn retry_in(&self, now: Instant) -> Option<Duration> {
        self.retry_at
            .map(|at| at.saturating_duration_since(now))
            .filter(|d| !d.is_zero())
    }

    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        policy.max_attempts.is_some_and(|max| self.failures >= max)
    }

    pub fn record_failure(&mut self, policy: &RetryPolicy, now: Instant) {
        self.failures = self.failures.saturating_add(1);
        let delay = policy.delay_for(self.failures);
        self.retry_at = Some(now.checked_add(delay).unwrap_or(now));
    }

    pub fn record_success(&mut self) {
        *self = Self::default();
    }
}
