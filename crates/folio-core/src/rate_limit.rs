//! Submission throttling for the contact form.
//!
//! An in-memory sliding-window limiter keyed by an opaque identifier (the
//! client fingerprint, in practice). Exceeding the window escalates the
//! identifier into a penalty box that rejects every attempt until the penalty
//! expires, regardless of what the window would allow.
//!
//! This runs entirely on the client and is trivially reset by reloading the
//! page or clearing state. It shapes UX; it does not enforce anything.
//!
//! # Configuration
//!
//! - `max_attempts`: attempts allowed inside the window (default 5)
//! - `window`: trailing window length (default 15 minutes)
//! - `penalty`: penalty-box duration after the window is exhausted (default 1
//!   hour)
//! - `cleanup_interval`: period of the scheduled [`RateLimiter::cleanup`]
//! - `max_tracked_identifiers`: hard cap on identifiers held in memory
//!
//! # Invariants
//!
//! - After a check or cleanup no window holds a timestamp older than `window`.
//! - An active penalty rejects every attempt until its own expiry.
//! - The number of tracked identifiers never exceeds
//!   `max_tracked_identifiers`.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::humantime_serde;

/// Configuration for the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum number of attempts allowed in the window.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Length of the trailing window.
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,

    /// How long an identifier stays blocked after exhausting the window.
    #[serde(default = "default_penalty", with = "humantime_serde")]
    pub penalty: Duration,

    /// Period of the scheduled cleanup pass.
    #[serde(default = "default_cleanup_interval", with = "humantime_serde")]
    pub cleanup_interval: Duration,

    /// Maximum number of distinct identifiers tracked at once.
    #[serde(default = "default_max_tracked_identifiers")]
    pub max_tracked_identifiers: usize,
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_window() -> Duration {
    Duration::from_secs(15 * 60)
}

const fn default_penalty() -> Duration {
    Duration::from_secs(60 * 60)
}

const fn default_cleanup_interval() -> Duration {
    Duration::from_secs(30)
}

const fn default_max_tracked_identifiers() -> usize {
    10_000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window: default_window(),
            penalty: default_penalty(),
            cleanup_interval: default_cleanup_interval(),
            max_tracked_identifiers: default_max_tracked_identifiers(),
        }
    }
}

/// Outcome of a single [`RateLimiter::check_attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The attempt was recorded.
    Allowed {
        /// Attempts left in the current window.
        remaining: u32,
    },
    /// The identifier is serving a penalty.
    Blocked,
    /// This attempt exhausted the window and started a penalty.
    LimitExceeded,
    /// The limiter is tracking as many identifiers as it may.
    Saturated,
}

impl RateDecision {
    /// Returns `true` if the attempt may proceed.
    #[must_use]
    pub const fn allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Machine-readable rejection reason, `None` when allowed.
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Allowed { .. } => None,
            Self::Blocked => Some("blocked"),
            Self::LimitExceeded => Some("limit_exceeded"),
            Self::Saturated => Some("saturated"),
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    attempts: HashMap<String, Vec<Instant>>,
    penalties: HashMap<String, Instant>,
}

impl LimiterState {
    fn prune(&mut self, now: Instant, window: Duration, penalty: Duration) {
        self.attempts.retain(|_, timestamps| {
            timestamps.retain(|&t| now.saturating_duration_since(t) < window);
            !timestamps.is_empty()
        });
        self.penalties
            .retain(|_, &mut start| now.saturating_duration_since(start) < penalty);
    }

    fn tracked(&self) -> usize {
        self.attempts.len() + self.penalties.keys().filter(|k| !self.attempts.contains_key(*k)).count()
    }
}

/// An in-memory sliding-window limiter with penalty-box escalation.
pub struct RateLimiter {
    config: RateLimitConfig,
    state: RwLock<LimiterState>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the given configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: RwLock::new(LimiterState::default()),
        }
    }

    /// Returns the limiter configuration.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks and records an attempt for `identifier` at the current time.
    ///
    /// The clock is tokio's, so paused-time tests drive it.
    pub fn check_attempt(&self, identifier: &str) -> RateDecision {
        self.check_attempt_at(identifier, tokio::time::Instant::now().into_std())
    }

    /// Checks and records an attempt for `identifier` at `now`.
    pub fn check_attempt_at(&self, identifier: &str, now: Instant) -> RateDecision {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        state.prune(now, self.config.window, self.config.penalty);

        if state.penalties.contains_key(identifier) {
            tracing::debug!(identifier = %identifier, "attempt rejected: penalty active");
            return RateDecision::Blocked;
        }

        let recent = state.attempts.get(identifier).map_or(0, Vec::len);
        if recent >= self.config.max_attempts as usize {
            state.penalties.insert(identifier.to_string(), now);
            tracing::warn!(
                identifier = %identifier,
                attempts = recent,
                max = self.config.max_attempts,
                penalty = %humantime::format_duration(self.config.penalty),
                "rate limit exceeded, penalty started"
            );
            return RateDecision::LimitExceeded;
        }

        if !state.attempts.contains_key(identifier)
            && state.tracked() >= self.config.max_tracked_identifiers
        {
            tracing::warn!(
                identifier = %identifier,
                tracked = state.tracked(),
                max_tracked = self.config.max_tracked_identifiers,
                "rejecting new identifier: tracking limit reached"
            );
            return RateDecision::Saturated;
        }

        state
            .attempts
            .entry(identifier.to_string())
            .or_default()
            .push(now);

        #[allow(clippy::cast_possible_truncation)]
        let remaining = self.config.max_attempts - recent as u32 - 1;
        RateDecision::Allowed { remaining }
    }

    /// Drops expired timestamps, empty windows and expired penalties.
    pub fn cleanup(&self) {
        self.cleanup_at(tokio::time::Instant::now().into_std());
    }

    /// [`cleanup`](Self::cleanup) against an explicit clock reading.
    pub fn cleanup_at(&self, now: Instant) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = state.tracked();
        state.prune(now, self.config.window, self.config.penalty);
        let after = state.tracked();
        if before != after {
            tracing::debug!(removed = before - after, remaining = after, "rate limiter cleanup");
        }
    }

    /// Returns the number of tracked identifiers (windows or penalties).
    #[must_use]
    pub fn tracked_identifiers(&self) -> usize {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.tracked()
    }

    /// Returns `true` if `identifier` has a penalty entry.
    ///
    /// Expired entries count until the next check or cleanup removes them.
    #[must_use]
    pub fn is_penalized(&self, identifier: &str) -> bool {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.penalties.contains_key(identifier)
    }

    /// Attempts recorded in the current window for `identifier`.
    #[must_use]
    pub fn attempts_in_window(&self, identifier: &str) -> usize {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.attempts.get(identifier).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("tracked_identifiers", &self.tracked_identifiers())
            .finish()
    }
}
