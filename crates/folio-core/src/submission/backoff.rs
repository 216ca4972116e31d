//! Delay policy between relay retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::humantime_serde;

/// Backoff configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// Same delay before every retry.
    Fixed {
        /// Delay duration.
        #[serde(with = "humantime_serde")]
        delay: Duration,
    },

    /// Exponential backoff.
    Exponential {
        /// Initial delay.
        #[serde(with = "humantime_serde")]
        initial_delay: Duration,

        /// Maximum delay.
        #[serde(with = "humantime_serde")]
        max_delay: Duration,

        /// Multiplier for each retry (default: 2.0).
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },

    /// Linear backoff.
    Linear {
        /// Initial delay.
        #[serde(with = "humantime_serde")]
        initial_delay: Duration,

        /// Increment per retry.
        #[serde(with = "humantime_serde")]
        increment: Duration,

        /// Maximum delay.
        #[serde(with = "humantime_serde")]
        max_delay: Duration,
    },
}

const fn default_multiplier() -> f64 {
    2.0
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let steps = retry.saturating_sub(1);
        match self {
            Self::Fixed { delay } => *delay,
            Self::Exponential {
                initial_delay,
                max_delay,
                multiplier,
            } => {
                #[allow(clippy::cast_possible_wrap)]
                let delay_secs = initial_delay.as_secs_f64() * multiplier.powi(steps as i32);
                Duration::try_from_secs_f64(delay_secs)
                    .unwrap_or(*max_delay)
                    .min(*max_delay)
            },
            Self::Linear {
                initial_delay,
                increment,
                max_delay,
            } => initial_delay
                .saturating_add(increment.saturating_mul(steps))
                .min(*max_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_one_second() {
        let backoff = BackoffConfig::default();
        for retry in 1..=3 {
            assert_eq!(backoff.delay_for_attempt(retry), Duration::from_secs(1));
        }
    }

    #[test]
    fn test_exponential_caps_at_max() {
        let backoff = BackoffConfig::Exponential {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
            multiplier: 2.0,
        };
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_secs(1));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_secs(2));
        assert_eq!(backoff.delay_for_attempt(4), Duration::from_secs(3));
        assert_eq!(backoff.delay_for_attempt(400), Duration::from_secs(3));
    }

    #[test]
    fn test_linear_increments() {
        let backoff = BackoffConfig::Linear {
            initial_delay: Duration::from_secs(1),
            increment: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(1500));
        assert_eq!(backoff.delay_for_attempt(10), Duration::from_secs(2));
    }
}
