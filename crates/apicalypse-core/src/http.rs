//! HTTP transport settings and retry policy.
//!
//! Both types are plain values derived from an [`ApicalypseConfig`]. Clients
//! read them when building their HTTP stack and when a request fails.

use crate::config::ApicalypseConfig;
use crate::Error;
use std::time::Duration;

/// Upper bound for a single backoff delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How often and how patiently a failed query is resent.
///
/// The delay doubles after every attempt, starting at `base_delay` and
/// capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Never resend a failed query.
    pub const DISABLED: Self = Self::new(0, Duration::ZERO);

    /// Retry up to `max_retries` times starting from `base_delay`.
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    /// Override the delay cap.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before retry number `attempt`, counted from 1.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let Some(doublings) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };

        let factor = 1u32.checked_shl(doublings).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Returns true if a query that failed with `error` on retry number
    /// `attempt` should be sent again.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32, error: &Error) -> bool {
        attempt <= self.max_retries && error.is_retryable()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ApicalypseConfig::default())
    }
}

impl From<&ApicalypseConfig> for RetryPolicy {
    fn from(config: &ApicalypseConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

/// Timeouts and retry policy for an HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// What to do when a query fails
    pub retry_policy: RetryPolicy,
}

impl ClientConfig {
    /// Derive transport settings from an [`ApicalypseConfig`].
    #[must_use]
    pub fn from_config(config: &ApicalypseConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            retry_policy: RetryPolicy::from(config),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_config(&ApicalypseConfig::default())
    }
}
