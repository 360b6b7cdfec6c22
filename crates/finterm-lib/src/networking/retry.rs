use std::time::Duration;

/// Upper bound on caller-requested retries
pub const MAX_RETRY_COUNT: u32 = 4;

/// Retries applied when the caller does not ask for a count
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// Statuses treated as transient. `0` is a transport failure or timeout.
const RETRYABLE_STATUSES: [u16; 5] = [0, 429, 502, 503, 504];

/// Exponential backoff with additive jitter and a hard cap
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial: Duration,
    /// Maximum backoff duration
    pub max: Duration,
    /// Random jitter added to each delay, drawn from `[0, jitter)`
    pub jitter: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max: Duration::from_millis(2_000),
            jitter: Duration::from_millis(120),
        }
    }
}

impl BackoffConfig {
    /// Backoff without jitter, for deterministic timing
    pub fn fixed_jitterless(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            jitter: Duration::ZERO,
        }
    }

    /// Delay before retrying after the 0-based `attempt` failed
    ///
    /// `min(initial * 2^attempt + jitter, max)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let scaled = self.initial.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(0..jitter_ms))
        };

        scaled.saturating_add(jitter).min(self.max)
    }
}

/// Whether a result status should be retried
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Clamp a caller-supplied retry count to `[0, MAX_RETRY_COUNT]`
pub fn clamp_retry_count(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_RETRY_COUNT).min(MAX_RETRY_COUNT)
}

#[cfg(test)]
mod tests {
    include!("retry.test.rs");
}
