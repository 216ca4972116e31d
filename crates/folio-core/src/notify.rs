//! Transient status banners.
//!
//! Success and warning notices clear themselves after their configured TTL;
//! errors stay until overwritten or cleared. Showing a notice cancels the
//! pending auto-clear of the previous one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::NoticeConfig;
use crate::schedule::{ScheduledTask, Scheduler};

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// The submission went through.
    Success,
    /// Something is in progress or needs attention.
    Warning,
    /// The action failed.
    Error,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A notice as shown in the status region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Text shown to the user.
    pub message: String,
    /// Severity.
    pub kind: StatusKind,
}

/// The element that displays notices.
pub trait StatusRegion: Send {
    /// Replaces the displayed notice.
    fn set(&mut self, notice: &Notice);

    /// Removes the displayed notice.
    fn clear(&mut self);

    /// Brings the region into view.
    fn scroll_into_view(&mut self) {}
}

/// A status region shared between the notifier and its timers.
pub type SharedRegion = Arc<Mutex<dyn StatusRegion>>;

/// A [`StatusRegion`] that keeps its state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatusRegion {
    current: Option<Notice>,
    history: Vec<Notice>,
    scrolls: usize,
}

impl MemoryStatusRegion {
    /// Creates an empty region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The notice currently displayed.
    #[must_use]
    pub const fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    /// Every notice displayed so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Notice] {
        &self.history
    }

    /// How many times the region was scrolled into view.
    #[must_use]
    pub const fn scrolls(&self) -> usize {
        self.scrolls
    }
}

impl StatusRegion for MemoryStatusRegion {
    fn set(&mut self, notice: &Notice) {
        self.current = Some(notice.clone());
        self.history.push(notice.clone());
    }

    fn clear(&mut self) {
        self.current = None;
    }

    fn scroll_into_view(&mut self) {
        self.scrolls += 1;
    }
}

/// Shows notices and schedules their auto-clear.
pub struct StatusNotifier {
    region: SharedRegion,
    config: NoticeConfig,
    scheduler: Scheduler,
    pending: Mutex<Option<ScheduledTask>>,
    generation: Arc<AtomicU64>,
}

impl StatusNotifier {
    /// Creates a notifier writing to `region`.
    #[must_use]
    pub fn new(region: SharedRegion, config: NoticeConfig, scheduler: Scheduler) -> Self {
        Self {
            region,
            config,
            scheduler,
            pending: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// How long a notice of `kind` stays up, `None` if it persists.
    #[must_use]
    pub const fn ttl(&self, kind: StatusKind) -> Option<Duration> {
        match kind {
            StatusKind::Success => Some(self.config.success_ttl),
            StatusKind::Warning => Some(self.config.warning_ttl),
            StatusKind::Error => None,
        }
    }

    /// Displays `message` and schedules its auto-clear.
    pub fn show(&self, message: impl Into<String>, kind: StatusKind) {
        let notice = Notice {
            message: message.into(),
            kind,
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_pending();

        tracing::debug!(kind = %kind, message = %notice.message, "showing notice");
        {
            let mut region = self
                .region
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            region.set(&notice);
            region.scroll_into_view();
        }

        let Some(ttl) = self.ttl(kind) else {
            return;
        };

        let region = Arc::clone(&self.region);
        let current = Arc::clone(&self.generation);
        let task = self.scheduler.after(ttl, async move {
            // A newer notice owns the region now.
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            region
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clear();
        });

        *self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(task);
    }

    /// Removes the current notice and cancels its auto-clear.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_pending();
        self.region
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    fn cancel_pending(&self) {
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(task) = previous {
            task.cancel();
        }
    }
}

impl fmt::Debug for StatusNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusNotifier")
            .field("config", &self.config)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
