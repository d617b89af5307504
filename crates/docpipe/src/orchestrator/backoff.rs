use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay before each generation attempt. Attempt 0 never waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    None,
    /// Same delay before every retry.
    Fixed(Duration),
    /// `delay * attempt`.
    Linear(Duration),
}

impl BackoffPolicy {
    pub fn from_strategy(strategy: BackoffStrategy, delay: Duration) -> Self {
        match strategy {
            BackoffStrategy::None => BackoffPolicy::None,
            BackoffStrategy::Fixed => BackoffPolicy::Fixed(delay),
            BackoffStrategy::Linear => BackoffPolicy::Linear(delay),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match self {
            BackoffPolicy::None => Duration::ZERO,
            BackoffPolicy::Fixed(delay) => *delay,
            BackoffPolicy::Linear(delay) => delay.saturating_mul(attempt),
        }
    }
}

/// Config-facing name of a [`BackoffPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    None,
    Fixed,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffPolicy::Linear(Duration::from_secs(5)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        let policy = BackoffPolicy::Linear(Duration::from_secs(10));
        let delays: Vec<u64> = (0..4).map(|a| policy.delay_for(a).as_secs()).collect();
        assert_eq!(delays, vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_fixed_backoff() {
        let policy = BackoffPolicy::Fixed(Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(7), Duration::from_millis(250));
    }

    #[test]
    fn test_no_backoff() {
        assert_eq!(BackoffPolicy::None.delay_for(3), Duration::ZERO);
    }

    #[test]
    fn test_from_strategy() {
        let delay = Duration::from_secs(2);
        assert_eq!(
            BackoffPolicy::from_strategy(BackoffStrategy::Linear, delay),
            BackoffPolicy::Linear(delay)
        );
        assert_eq!(
            BackoffPolicy::from_strategy(BackoffStrategy::None, delay),
            BackoffPolicy::None
        );
    }
}
