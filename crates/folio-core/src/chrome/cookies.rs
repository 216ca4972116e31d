//! Cookie consent banner.

use std::fmt;
use std::time::Duration;

use crate::storage::{SharedStore, StorageError, keys};

/// Delay before the banner appears on a fresh visit.
pub const COOKIE_BANNER_DELAY: Duration = Duration::from_millis(2000);

const ACCEPTED: &str = "true";

/// Consent state and banner visibility.
///
/// Only acceptance is remembered. Declining hides the banner for the current
/// page view, and it comes back on the next one.
pub struct CookieConsent {
    store: SharedStore,
    accepted: bool,
    visible: bool,
}

impl fmt::Debug for CookieConsent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieConsent")
            .field("accepted", &self.accepted)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl CookieConsent {
    /// Reads the stored consent.
    pub fn load(store: SharedStore) -> Result<Self, StorageError> {
        let accepted = store.get(keys::COOKIES_ACCEPTED)?.as_deref() == Some(ACCEPTED);
        Ok(Self {
            store,
            accepted,
            visible: false,
        })
    }

    /// Returns `true` if the visitor accepted cookies.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Returns `true` while the banner is shown.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// How long to wait before showing the banner, or `None` if it should not
    /// be shown at all.
    #[must_use]
    pub const fn banner_delay(&self) -> Option<Duration> {
        if self.accepted {
            None
        } else {
            Some(COOKIE_BANNER_DELAY)
        }
    }

    /// Shows the banner unless consent was already given.
    pub fn show(&mut self) -> bool {
        if self.accepted {
            return false;
        }
        self.visible = true;
        true
    }

    /// Records consent and hides the banner.
    pub fn accept(&mut self) -> Result<(), StorageError> {
        self.store.set(keys::COOKIES_ACCEPTED, ACCEPTED)?;
        self.accepted = true;
        self.visible = false;
        tracing::debug!("cookies accepted");
        Ok(())
    }

    /// Hides the banner without recording anything.
    pub fn decline(&mut self) {
        self.visible = false;
    }

    /// A key was pressed while the page had focus.
    pub fn on_key(&mut self, key: &str) -> bool {
        if key != "Escape" || !self.visible {
            return false;
        }
        self.decline();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    #[test]
    fn test_fresh_visit_shows_after_delay() {
        let mut consent = CookieConsent::load(Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(consent.banner_delay(), Some(COOKIE_BANNER_DELAY));
        assert!(!consent.is_visible());
        assert!(consent.show());
        assert!(consent.is_visible());
    }

    #[test]
    fn test_accept_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut consent = CookieConsent::load(store.clone()).unwrap();
        consent.show();
        consent.accept().unwrap();
        assert!(!consent.is_visible());
        assert_eq!(
            store.get(keys::COOKIES_ACCEPTED).unwrap().as_deref(),
            Some("true")
        );

        let mut reloaded = CookieConsent::load(store).unwrap();
        assert!(reloaded.is_accepted());
        assert_eq!(reloaded.banner_delay(), None);
        assert!(!reloaded.show());
    }

    #[test]
    fn test_decline_and_escape_do_not_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut consent = CookieConsent::load(store.clone()).unwrap();
        consent.show();
        consent.decline();
        assert!(!consent.is_visible());

        consent.show();
        assert!(!consent.on_key("Tab"));
        assert!(consent.on_key("Escape"));
        assert!(!consent.is_visible());

        assert_eq!(store.get(keys::COOKIES_ACCEPTED).unwrap(), None);
        assert!(!CookieConsent::load(store).unwrap().is_accepted());
    }
}
