use crate::config::Config;
use failsafe::backoff;
use std::time::Duration;

/// Bounded retry for dataset fetches.
///
/// # Configuration
///
/// - **Attempts**: `FETCH_MAX_ATTEMPTS` total tries (first call included).
/// - **Backoff**: exponential from 1s, capped at 2s, between attempts.
///
/// Only retryable failures (transport errors, 5xx) consume further attempts;
/// see [`crate::errors::FetchError::is_retryable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Zero disables waiting between attempts.
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.fetch_max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A policy that retries without sleeping, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delays to sleep before the second, third, ... attempt.
    pub fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        if self.initial_delay.is_zero() {
            return Box::new(backoff::constant(Duration::ZERO));
        }
        // failsafe only accepts whole-second bounds.
        let start = self.initial_delay.max(Duration::from_secs(1));
        let max = self.max_delay.max(start);
        Box::new(backoff::exponential(start, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_grow_and_stay_capped() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = policy.delays().take(6).collect();

        assert_eq!(delays.len(), 6);
        assert_eq!(delays[0], Duration::from_secs(1));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= policy.max_delay));
        assert!(delays.last().unwrap() > delays.first().unwrap());
    }

    #[test]
    fn test_policy_from_config() {
        let config = Config {
            fetch_max_attempts: 5,
            ..Config::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delays().next(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate(3);
        assert!(policy.delays().take(3).all(|d| d.is_zero()));
    }

    #[test]
    fn test_sub_second_bounds_are_rounded_up() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(500),
        };
        let delays: Vec<Duration> = policy.delays().take(3).collect();
        assert!(delays.iter().all(|d| *d == Duration::from_secs(1)));
    }
}
