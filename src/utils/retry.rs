//! Backoff policy for transient upstream failures.

use std::time::Duration;

use crate::error::AppError;
use crate::models::ScrapeConfig;

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Retry `max_retries` times without waiting.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (0-based) after `error`.
    ///
    /// An upstream `Retry-After` wins over the computed delay but is still
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32, error: &AppError) -> Duration {
        if let AppError::RateLimited {
            retry_after_secs: Some(secs),
        } = error
        {
            return Duration::from_secs(*secs).min(self.max_delay);
        }
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScrapeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let p = policy();
        let err = AppError::status(503, "search");
        assert_eq!(p.delay_for(0, &err), Duration::from_millis(500));
        assert_eq!(p.delay_for(1, &err), Duration::from_millis(1000));
        assert_eq!(p.delay_for(2, &err), Duration::from_millis(2000));
        assert_eq!(p.delay_for(3, &err), Duration::from_secs(3));
        assert_eq!(p.delay_for(40, &err), Duration::from_secs(3));
    }

    #[test]
    fn test_retry_after_overrides() {
        let p = policy();
        let err = AppError::RateLimited {
            retry_after_secs: Some(2),
        };
        assert_eq!(p.delay_for(0, &err), Duration::from_secs(2));

        let long = AppError::RateLimited {
            retry_after_secs: Some(600),
        };
        assert_eq!(p.delay_for(0, &long), Duration::from_secs(3));
    }

    #[test]
    fn test_attempts() {
        assert_eq!(policy().max_attempts(), 4);
        assert_eq!(RetryPolicy::immediate(0).max_attempts(), 1);
    }

    #[test]
    fn test_from_config() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.base_delay, Duration::from_secs(1));
        assert_eq!(p.max_delay, Duration::from_secs(30));
    }
}
