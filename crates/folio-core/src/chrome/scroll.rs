//! Back-to-top button and reading-progress bar.

use std::time::{Duration, Instant};

/// Scroll offset (px) above which the back-to-top button shows.
pub const BACK_TO_TOP_THRESHOLD: f64 = 300.0;

/// Minimum time between progress bar updates.
pub const PROGRESS_THROTTLE: Duration = Duration::from_millis(16);

/// Visibility of the back-to-top button.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackToTop {
    visible: bool,
}

impl BackToTop {
    /// A hidden button.
    #[must_use]
    pub const fn new() -> Self {
        Self { visible: false }
    }

    /// Returns `true` while the button is shown.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Feeds a scroll offset. Returns the new visibility only when it changed.
    pub fn on_scroll(&mut self, offset: f64) -> Option<bool> {
        let visible = offset > BACK_TO_TOP_THRESHOLD;
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        Some(visible)
    }
}

/// Throttled reading-progress percentage.
#[derive(Debug, Clone, Default)]
pub struct ScrollProgress {
    last_update: Option<Instant>,
    percent: f64,
}

impl ScrollProgress {
    /// A bar at 0 %.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_update: None,
            percent: 0.0,
        }
    }

    /// The last reported percentage.
    #[must_use]
    pub const fn percent(&self) -> f64 {
        self.percent
    }

    /// Percentage of the scrollable height covered by `scroll_top`.
    ///
    /// Pages that do not scroll report 0; the result is clamped to `0..=100`.
    #[must_use]
    pub fn compute(scroll_top: f64, scroll_height: f64, client_height: f64) -> f64 {
        let scrollable = scroll_height - client_height;
        if scrollable <= 0.0 {
            return 0.0;
        }
        (scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
    }

    /// Feeds a scroll event at `now`.
    ///
    /// Returns the new percentage, or `None` when the event fell inside the
    /// throttle window of the previous update.
    pub fn on_scroll(
        &mut self,
        now: Instant,
        scroll_top: f64,
        scroll_height: f64,
        client_height: f64,
    ) -> Option<f64> {
        if let Some(last) = self.last_update {
            if now.saturating_duration_since(last) < PROGRESS_THROTTLE {
                return None;
            }
        }
        self.last_update = Some(now);
        self.percent = Self::compute(scroll_top, scroll_height, client_height);
        Some(self.percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_to_top_reports_changes_only() {
        let mut button = BackToTop::new();
        assert_eq!(button.on_scroll(100.0), None);
        assert_eq!(button.on_scroll(300.0), None);
        assert_eq!(button.on_scroll(301.0), Some(true));
        assert_eq!(button.on_scroll(900.0), None);
        assert_eq!(button.on_scroll(0.0), Some(false));
        assert!(!button.is_visible());
    }

    #[test]
    fn test_progress_percentage() {
        assert!((ScrollProgress::compute(500.0, 2000.0, 1000.0) - 50.0).abs() < f64::EPSILON);
        assert!((ScrollProgress::compute(1000.0, 2000.0, 1000.0) - 100.0).abs() < f64::EPSILON);
        assert!(ScrollProgress::compute(10.0, 800.0, 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_is_throttled() {
        let mut bar = ScrollProgress::new();
        let t0 = Instant::now();

        assert!(bar.on_scroll(t0, 250.0, 2000.0, 1000.0).is_some());
        assert!(
            bar.on_scroll(t0 + Duration::from_millis(10), 750.0, 2000.0, 1000.0)
                .is_none()
        );
        assert!((bar.percent() - 25.0).abs() < f64::EPSILON);

        let update = bar.on_scroll(t0 + Duration::from_millis(16), 750.0, 2000.0, 1000.0);
        assert_eq!(update, Some(75.0));
    }
}
