//! Stat counters that count up once when scrolled into view.

use std::time::Duration;

/// Length of the count-up animation.
pub const COUNTER_DURATION: Duration = Duration::from_millis(2000);

/// `1 - (1 - p)^4`, with `p` clamped to `0..=1`.
#[must_use]
pub fn ease_out_quart(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(4)
}

/// One labelled counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    /// Element id of the counter.
    pub label: String,
    /// Final value.
    pub target: u32,
}

impl Counter {
    /// Creates a counter.
    pub fn new(label: impl Into<String>, target: u32) -> Self {
        Self {
            label: label.into(),
            target,
        }
    }

    /// Displayed value `elapsed` into the animation.
    #[must_use]
    pub fn value_at(&self, elapsed: Duration) -> u32 {
        if elapsed >= COUNTER_DURATION {
            return self.target;
        }
        let progress = elapsed.as_secs_f64() / COUNTER_DURATION.as_secs_f64();
        let value = (ease_out_quart(progress) * f64::from(self.target)).floor();
        // Bounded by `target` since the easing never exceeds 1.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value as u32;
        value.min(self.target)
    }
}

/// The stats section's counters.
#[derive(Debug, Clone)]
pub struct AnimatedCounters {
    counters: Vec<Counter>,
    started: bool,
}

impl Default for AnimatedCounters {
    fn default() -> Self {
        Self::new(vec![
            Counter::new("cert-count", 8),
            Counter::new("project-count", 12),
            Counter::new("skill-count", 18),
            Counter::new("client-count", 5),
        ])
    }
}

impl AnimatedCounters {
    /// Creates a set of counters that has not started.
    #[must_use]
    pub const fn new(counters: Vec<Counter>) -> Self {
        Self {
            counters,
            started: false,
        }
    }

    /// The counters.
    #[must_use]
    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    /// Returns `true` once the animation has been triggered.
    #[must_use]
    pub const fn started(&self) -> bool {
        self.started
    }

    /// The section's visibility changed.
    ///
    /// Returns `true` exactly once: the first time it becomes visible.
    pub fn on_intersection(&mut self, visible: bool) -> bool {
        if !visible || self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Displayed values `elapsed` after the animation started, or zeros if
    /// it has not.
    #[must_use]
    pub fn values_at(&self, elapsed: Duration) -> Vec<(&str, u32)> {
        self.counters
            .iter()
            .map(|counter| {
                let value = if self.started {
                    counter.value_at(elapsed)
                } else {
                    0
                };
                (counter.label.as_str(), value)
            })
            .collect()
    }
}
