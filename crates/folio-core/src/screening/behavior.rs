//! Behavioral scoring and the violation counter.
//!
//! Timestamps are milliseconds on any monotonic clock the caller chooses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

const MAX_POINTER_SAMPLES: usize = 100;
const MIN_POINTER_SAMPLES: usize = 10;
const MIN_KEYSTROKES: usize = 20;
const MIN_SCROLL_SAMPLES: usize = 10;
const MAX_SAMPLES: usize = 1000;

const POINTER_VARIANCE_LIMIT: f64 = 5.0;
const KEYSTROKE_VARIANCE_LIMIT: f64 = 10.0;
const SCROLL_VARIANCE_LIMIT: f64 = 1.0;

const ROBOTIC_POINTER_SCORE: u32 = 30;
const AUTOMATED_TYPING_SCORE: u32 = 25;
const BOT_SCROLL_SCORE: u32 = 20;

/// Scores above this are reported by the periodic scan.
pub const REPORT_THRESHOLD: u32 = 70;

/// Submissions scoring below this are treated as automated.
pub const HUMAN_SCORE_THRESHOLD: u32 = 70;

const QUICK_FILL_PENALTY: u32 = 30;
const AUTOMATED_TYPING_PENALTY: u32 = 15;
const ROBOTIC_POINTER_PENALTY: u32 = 15;

const RAPID_KEY_GAP_MS: u64 = 50;
const RAPID_KEY_LIMIT: u32 = 10;
const QUICK_FILL_MS: u64 = 5000;

fn variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n
}

/// Collects pointer, keyboard and scroll samples and scores how scripted they
/// look.
#[derive(Debug, Clone, Default)]
pub struct BehaviorMonitor {
    pointer: VecDeque<(f64, f64)>,
    keystrokes: Vec<u64>,
    scrolls: Vec<(f64, u64)>,
    rapid_keys: u32,
    form_started_ms: Option<u64>,
}

impl BehaviorMonitor {
    /// Creates an empty monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pointer position. Only the last 100 are kept.
    pub fn record_pointer(&mut self, x: f64, y: f64) {
        self.pointer.push_back((x, y));
        if self.pointer.len() > MAX_POINTER_SAMPLES {
            self.pointer.pop_front();
        }
    }

    /// Records a keystroke at `at_ms`.
    ///
    /// Returns `true` when more than ten near-instant keystrokes have piled
    /// up, which counts as one robotic-typing violation. The counter restarts
    /// after reporting.
    pub fn record_keystroke(&mut self, at_ms: u64) -> bool {
        let gap = self.keystrokes.last().map(|&prev| at_ms.saturating_sub(prev));
        if self.keystrokes.len() == MAX_SAMPLES {
            self.keystrokes.remove(0);
        }
        self.keystrokes.push(at_ms);

        match gap {
            Some(gap) if gap < RAPID_KEY_GAP_MS => {
                self.rapid_keys += 1;
                if self.rapid_keys > RAPID_KEY_LIMIT {
                    self.rapid_keys = 0;
                    tracing::debug!("robotic typing pattern");
                    return true;
                }
            },
            Some(_) => {
                self.rapid_keys = self.rapid_keys.saturating_sub(1);
            },
            None => {},
        }
        false
    }

    /// Records a scroll offset at `at_ms`.
    pub fn record_scroll(&mut self, offset: f64, at_ms: u64) {
        if self.scrolls.len() == MAX_SAMPLES {
            self.scrolls.remove(0);
        }
        self.scrolls.push((offset, at_ms));
    }

    /// Marks the first interaction with the form.
    pub fn form_started(&mut self, at_ms: u64) {
        self.form_started_ms.get_or_insert(at_ms);
    }

    /// Near-constant step lengths between pointer samples.
    #[must_use]
    pub fn robotic_pointer(&self) -> bool {
        if self.pointer.len() < MIN_POINTER_SAMPLES {
            return false;
        }
        let distances: Vec<f64> = self
            .pointer
            .iter()
            .zip(self.pointer.iter().skip(1))
            .map(|(a, b)| (b.0 - a.0).hypot(b.1 - a.1))
            .collect();
        variance(&distances) < POINTER_VARIANCE_LIMIT
    }

    /// Near-constant intervals between keystrokes.
    #[must_use]
    pub fn automated_typing(&self) -> bool {
        if self.keystrokes.len() < MIN_KEYSTROKES {
            return false;
        }
        #[allow(clippy::cast_precision_loss)]
        let intervals: Vec<f64> = self
            .keystrokes
            .windows(2)
            .map(|w| w[1].saturating_sub(w[0]) as f64)
            .collect();
        variance(&intervals) < KEYSTROKE_VARIANCE_LIMIT
    }

    /// Scrolling in identical non-zero steps.
    #[must_use]
    pub fn bot_scrolling(&self) -> bool {
        if self.scrolls.len() < MIN_SCROLL_SAMPLES {
            return false;
        }
        let steps: Vec<f64> = self.scrolls.windows(2).map(|w| w[1].0 - w[0].0).collect();
        let moved = steps.iter().any(|s| s.abs() > f64::EPSILON);
        moved && variance(&steps) < SCROLL_VARIANCE_LIMIT
    }

    /// Sum of the behavioral indicators, 0 to 75.
    #[must_use]
    pub fn suspicion_score(&self) -> u32 {
        let mut score = 0;
        if self.robotic_pointer() {
            score += ROBOTIC_POINTER_SCORE;
        }
        if self.automated_typing() {
            score += AUTOMATED_TYPING_SCORE;
        }
        if self.bot_scrolling() {
            score += BOT_SCROLL_SCORE;
        }
        score
    }

    /// Runs one periodic scan; logs and returns the score when it exceeds the
    /// report threshold.
    pub fn scan(&self) -> Option<u32> {
        let score = self.suspicion_score();
        if score > REPORT_THRESHOLD {
            tracing::warn!(score, "suspicious interaction pattern");
            Some(score)
        } else {
            tracing::trace!(score, "behavior scan");
            None
        }
    }

    /// Confidence (0 to 100) that a submission at `at_ms` came from a human.
    ///
    /// Filling the form in under five seconds costs 30 points, metronome
    /// typing and straight-line pointer movement 15 each. A form that was
    /// never focused counts as filled instantly.
    #[must_use]
    pub fn submission_score(&self, at_ms: u64) -> u32 {
        let mut score: u32 = 100;
        let elapsed = self
            .form_started_ms
            .map_or(0, |start| at_ms.saturating_sub(start));
        if elapsed < QUICK_FILL_MS {
            score -= QUICK_FILL_PENALTY;
        }
        if self.automated_typing() {
            score -= AUTOMATED_TYPING_PENALTY;
        }
        if self.robotic_pointer() {
            score -= ROBOTIC_POINTER_PENALTY;
        }
        score
    }

    /// Whether a submission at `at_ms` scores below
    /// [`HUMAN_SCORE_THRESHOLD`].
    #[must_use]
    pub fn looks_automated(&self, at_ms: u64) -> bool {
        self.submission_score(at_ms) < HUMAN_SCORE_THRESHOLD
    }
}

/// Result of recording a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatStatus {
    /// Below the lockdown threshold.
    Elevated(u32),
    /// The threshold was reached by this violation.
    Lockdown,
    /// Already locked down.
    Locked,
}

/// Counts violations and locks the form at a threshold.
#[derive(Debug)]
pub struct ThreatLevel {
    level: AtomicU32,
    step: u32,
    max: u32,
}

impl Default for ThreatLevel {
    fn default() -> Self {
        Self::new(2, 10)
    }
}

impl ThreatLevel {
    /// Each violation adds `step`; reaching `max` locks the form.
    #[must_use]
    pub const fn new(step: u32, max: u32) -> Self {
        Self {
            level: AtomicU32::new(0),
            step,
            max,
        }
    }

    /// Records one violation.
    pub fn record_violation(&self, reason: &str) -> ThreatStatus {
        let previous = self.level.fetch_add(self.step, Ordering::SeqCst);
        if previous >= self.max {
            return ThreatStatus::Locked;
        }
        let level = previous + self.step;
        if level >= self.max {
            tracing::warn!(reason, level, "violation threshold reached, locking form");
            ThreatStatus::Lockdown
        } else {
            tracing::info!(reason, level, "client violation recorded");
            ThreatStatus::Elevated(level)
        }
    }

    /// Current level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level.load(Ordering::SeqCst)
    }

    /// Whether the form is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.level() >= self.max
    }
}
