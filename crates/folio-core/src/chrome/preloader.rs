//! Loading overlay.

use std::time::Duration;

/// How long the overlay stays after the window `load` event.
pub const PRELOADER_DELAY: Duration = Duration::from_millis(1000);

/// Length of the fade-out before the overlay is removed.
pub const PRELOADER_FADE: Duration = Duration::from_millis(500);

/// Where the overlay is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloaderPhase {
    /// Fully opaque.
    Visible,
    /// Opacity transitioning to 0.
    Fading,
    /// Removed from layout.
    Hidden,
}

/// The loading overlay, driven by time since the window finished loading.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preloader {
    loaded: bool,
}

impl Preloader {
    /// An overlay waiting for the page to load.
    #[must_use]
    pub const fn new() -> Self {
        Self { loaded: false }
    }

    /// The window `load` event fired.
    pub fn on_window_load(&mut self) {
        self.loaded = true;
    }

    /// Phase `since_load` after the window finished loading.
    #[must_use]
    pub fn phase(&self, since_load: Duration) -> PreloaderPhase {
        if !self.loaded || since_load < PRELOADER_DELAY {
            PreloaderPhase::Visible
        } else if since_load < PRELOADER_DELAY + PRELOADER_FADE {
            PreloaderPhase::Fading
        } else {
            PreloaderPhase::Hidden
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases() {
        let mut preloader = Preloader::new();
        assert_eq!(preloader.phase(Duration::from_secs(5)), PreloaderPhase::Visible);

        preloader.on_window_load();
        assert_eq!(preloader.phase(Duration::from_millis(999)), PreloaderPhase::Visible);
        assert_eq!(preloader.phase(Duration::from_millis(1000)), PreloaderPhase::Fading);
        assert_eq!(preloader.phase(Duration::from_millis(1499)), PreloaderPhase::Fading);
        assert_eq!(preloader.phase(Duration::from_millis(1500)), PreloaderPhase::Hidden);
    }
}
