//! Mobile navigation menu.

/// Viewport width (px) at or below which the menu is in mobile mode.
pub const MOBILE_BREAKPOINT: u32 = 768;

/// Open/closed state of the collapsible navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobileMenu {
    open: bool,
    breakpoint: u32,
}

impl Default for MobileMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl MobileMenu {
    /// A closed menu with the default breakpoint.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open: false,
            breakpoint: MOBILE_BREAKPOINT,
        }
    }

    /// Returns `true` while the menu is expanded.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Value for the toggle's `aria-expanded` attribute.
    #[must_use]
    pub const fn aria_expanded(&self) -> &'static str {
        if self.open { "true" } else { "false" }
    }

    /// Flips the menu and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        tracing::trace!(open = self.open, "menu toggled");
        self.open
    }

    /// Closes the menu. Returns `true` if it was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// A navigation link was followed.
    pub fn on_link_click(&mut self, viewport_width: u32) -> bool {
        viewport_width <= self.breakpoint && self.close()
    }

    /// The viewport was resized.
    pub fn on_resize(&mut self, viewport_width: u32) -> bool {
        viewport_width > self.breakpoint && self.close()
    }

    /// A click landed outside both the menu and its toggle.
    pub fn on_outside_click(&mut self) -> bool {
        self.close()
    }

    /// A key was pressed anywhere on the page.
    pub fn on_key(&mut self, key: &str) -> bool {
        key == "Escape" && self.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_updates_aria() {
        let mut menu = MobileMenu::new();
        assert_eq!(menu.aria_expanded(), "false");
        assert!(menu.toggle());
        assert_eq!(menu.aria_expanded(), "true");
        assert!(!menu.toggle());
        assert_eq!(menu.aria_expanded(), "false");
    }

    #[test]
    fn test_link_click_closes_only_on_mobile() {
        let mut menu = MobileMenu::new();
        menu.toggle();
        assert!(!menu.on_link_click(1024));
        assert!(menu.is_open());
        assert!(menu.on_link_click(768));
        assert!(!menu.is_open());
    }

    #[test]
    fn test_resize_past_breakpoint_closes() {
        let mut menu = MobileMenu::new();
        menu.toggle();
        assert!(!menu.on_resize(600));
        assert!(menu.is_open());
        assert!(menu.on_resize(769));
        assert!(!menu.is_open());
    }

    #[test]
    fn test_escape_and_outside_click() {
        let mut menu = MobileMenu::new();
        menu.toggle();
        assert!(!menu.on_key("Enter"));
        assert!(menu.on_key("Escape"));

        menu.toggle();
        assert!(menu.on_outside_click());
        // Already closed.
        assert!(!menu.on_outside_click());
        assert!(!menu.on_key("Escape"));
    }
}
