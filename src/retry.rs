//! Retry policy for webhook delivery

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy configuration.
///
/// A policy allows `max_retries` additional attempts after the first, so a
/// destination that never responds sees `max_retries + 1` attempts in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try
    pub max_retries: u32,

    /// Per-attempt timeout; falls back to the sender-wide default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: None,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given retry budget
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            timeout: None,
        }
    }

    /// Create a policy with no retries
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check whether another attempt may follow the given number of
    /// completed attempts (1-based count)
    pub fn should_retry(&self, completed_attempts: u32) -> bool {
        completed_attempts <= self.max_retries
    }

    /// Backoff to wait after the given 0-based attempt before the next one:
    /// `attempt × (attempt + 1)` seconds, so 0s, 2s, 6s, 12s, ...
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let attempt = u64::from(attempt);
        Duration::from_secs(attempt * (attempt + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert!(policy.timeout.is_none());
    }

    #[test]
    fn test_no_retries() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(1));
    }

    #[test]
    fn test_retry_budget() {
        let policy = RetryPolicy::new(3);

        // After attempts 1..=3 another try is allowed; after the 4th it is not.
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_quadratic_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_after_attempt(0), Duration::from_secs(0));
        assert_eq!(policy.delay_after_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_secs(6));
        assert_eq!(policy.delay_after_attempt(3), Duration::from_secs(12));
        assert_eq!(policy.delay_after_attempt(4), Duration::from_secs(20));
    }

    #[test]
    fn test_with_timeout() {
        let policy = RetryPolicy::new(1).with_timeout(Duration::from_secs(5));
        assert_eq!(policy.timeout, Some(Duration::from_secs(5)));
    }
}
