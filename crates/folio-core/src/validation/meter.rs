//! Live length counter for the message field.

use super::MessageLimit;

/// Fraction of the limit above which the counter warns.
const NEAR_LIMIT_RATIO: f64 = 0.8;

/// Counter severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterLevel {
    /// Comfortably under the limit.
    Normal,
    /// Above 80% of the limit.
    NearLimit,
    /// Above the limit.
    OverLimit,
}

/// One reading of the message counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterReading {
    /// Measured length in the limit's unit.
    pub count: usize,
    /// The configured maximum.
    pub limit: usize,
    /// Severity.
    pub level: MeterLevel,
    /// Display label, e.g. `"420/1000 characters"`.
    pub label: String,
}

impl MeterReading {
    /// Whether the form may be submitted at this length.
    #[must_use]
    pub fn allows_submit(&self) -> bool {
        self.level != MeterLevel::OverLimit
    }
}

/// Measures message length against a [`MessageLimit`].
#[derive(Debug, Clone, Copy)]
pub struct MessageMeter {
    limit: MessageLimit,
}

impl MessageMeter {
    /// Creates a meter for `limit`.
    #[must_use]
    pub const fn new(limit: MessageLimit) -> Self {
        Self { limit }
    }

    /// Reads the counter for `text`.
    #[must_use]
    pub fn read(&self, text: &str) -> MeterReading {
        let text = text.trim();
        let count = self.limit.measure(text);
        let limit = self.limit.max();

        #[allow(clippy::cast_precision_loss)]
        let level = if count > limit {
            MeterLevel::OverLimit
        } else if count as f64 > limit as f64 * NEAR_LIMIT_RATIO {
            MeterLevel::NearLimit
        } else {
            MeterLevel::Normal
        };

        MeterReading {
            count,
            limit,
            level,
            label: format!("{count}/{limit} {}", self.limit.unit()),
        }
    }
}
