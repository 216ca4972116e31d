//! Status region that writes notices to stderr.

use folio_core::notify::{Notice, StatusKind, StatusRegion};

/// Prints each notice as it is shown and remembers the latest.
#[derive(Debug, Default)]
pub struct TerminalStatus {
    last: Option<Notice>,
}

impl TerminalStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The notice on display, if any.
    pub const fn last(&self) -> Option<&Notice> {
        self.last.as_ref()
    }
}

impl StatusRegion for TerminalStatus {
    fn set(&mut self, notice: &Notice) {
        let tag = match notice.kind {
            StatusKind::Success => "ok",
            StatusKind::Warning => "warn",
            StatusKind::Error => "error",
        };
        eprintln!("[{tag}] {}", notice.message);
        self.last = Some(notice.clone());
    }

    fn clear(&mut self) {
        self.last = None;
    }
}
