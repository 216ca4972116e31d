//! Error types for the submission pipeline.

use thiserror::Error;

use super::relay::RelayError;
use crate::rate_limit::RateDecision;

/// Why a single send failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptFailure {
    /// No response from the relay.
    #[error(transparent)]
    Network(#[from] RelayError),

    /// The relay answered with a non-2xx status.
    #[error("relay answered with status {0}")]
    Status(u16),
}

/// Errors that end a pipeline run.
///
/// `Display` carries diagnostic detail for logs; [`user_message`] is what the
/// visitor sees.
///
/// [`user_message`]: SubmissionError::user_message
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    /// Another run is already in flight.
    #[error("submission already in progress")]
    InFlight,

    /// The form is locked down after repeated violations.
    #[error("form locked down")]
    Locked,

    /// One or more fields failed validation.
    #[error("{invalid_fields} field(s) failed validation")]
    Validation {
        /// Number of failing fields.
        invalid_fields: usize,
    },

    /// A honeypot field was filled in.
    #[error("submission screened out")]
    Screened,

    /// The rate limiter rejected the attempt.
    #[error("submission throttled: {}", decision.reason().unwrap_or("unknown"))]
    Throttled {
        /// The limiter's decision.
        decision: RateDecision,
    },

    /// Every allowed send failed.
    #[error("submission failed after {attempts} attempt(s): {last}")]
    Terminal {
        /// Sends made, including the first.
        attempts: u32,
        /// The last failure.
        last: AttemptFailure,
    },
}

impl SubmissionError {
    /// The generic message shown to the visitor.
    ///
    /// Never includes relay, limiter or screening detail.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InFlight => "Please wait, your message is still being sent.",
            Self::Locked => "The form is temporarily unavailable. Please try again later.",
            Self::Validation { .. } => "Please correct the highlighted fields.",
            Self::Screened => "Your message could not be sent.",
            Self::Throttled { .. } => "Too many attempts. Please try again later.",
            Self::Terminal { .. } => {
                "Your message could not be sent. Please try again later or reach out by email."
            },
        }
    }

    /// Short category name for logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InFlight => "in_flight",
            Self::Locked => "locked",
            Self::Validation { .. } | Self::Screened => "validation",
            Self::Throttled { .. } => "throttle",
            Self::Terminal { .. } => "terminal",
        }
    }

    /// Whether the visitor can fix this by editing the form.
    #[must_use]
    pub const fn is_user_fixable(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_do_not_leak_details() {
        let err = SubmissionError::Terminal {
            attempts: 3,
            last: AttemptFailure::Network(RelayError::Transport(
                "dns error: relay.internal".into(),
            )),
        };
        assert!(err.to_string().contains("relay.internal"));
        assert!(!err.user_message().contains("relay.internal"));

        let err = SubmissionError::Throttled {
            decision: RateDecision::LimitExceeded,
        };
        assert_eq!(err.to_string(), "submission throttled: limit_exceeded");
        assert!(!err.user_message().contains("limit_exceeded"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(SubmissionError::Screened.category(), "validation");
        assert_eq!(SubmissionError::InFlight.category(), "in_flight");
        assert!(SubmissionError::Validation { invalid_fields: 2 }.is_user_fixable());
        assert!(!SubmissionError::Locked.is_user_fixable());
    }
}
