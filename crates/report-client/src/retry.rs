use std::time::Duration;

/// Backoff schedule for backend calls. Attempts are counted from 1.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            multiplier: 2,
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Whether another attempt follows the failed `attempt`.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Pause after the failed `attempt`: `min_backoff` after the first,
    /// growing by `multiplier`, capped at `max_backoff`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.min_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}
