//! Light/dark theme selection.

use std::fmt;
use std::str::FromStr;

use crate::storage::{SharedStore, StorageError, keys};

/// A colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    /// Light scheme.
    Light,
    /// Dark scheme.
    Dark,
}

impl Theme {
    /// The value stored in `data-theme` and in local storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Icon class shown on the toggle button.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Light => "fa-sun",
            Self::Dark => "fa-moon",
        }
    }

    /// Content of the `theme-color` meta tag.
    #[must_use]
    pub const fn meta_color(self) -> &'static str {
        match self {
            Self::Light => "#ffffff",
            Self::Dark => "#1a1a1a",
        }
    }

    const fn from_preference(prefers_dark: bool) -> Self {
        if prefers_dark { Self::Dark } else { Self::Light }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme '{other}', expected 'light' or 'dark'")),
        }
    }
}

/// Tracks the active theme and whether the visitor picked it.
///
/// A theme only counts as picked once it is written to storage; until then
/// the system preference drives it.
pub struct ThemeManager {
    store: SharedStore,
    current: Theme,
}

impl fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeManager")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl ThemeManager {
    /// Resolves the initial theme: the saved one, else the system preference.
    ///
    /// An unreadable saved value is ignored.
    pub fn load(store: SharedStore, system_prefers_dark: bool) -> Result<Self, StorageError> {
        let saved = store
            .get(keys::THEME)?
            .and_then(|value| value.parse::<Theme>().ok());
        let current = saved.unwrap_or(Theme::from_preference(system_prefers_dark));
        tracing::debug!(theme = %current, saved = saved.is_some(), "theme resolved");
        Ok(Self { store, current })
    }

    /// The active theme.
    #[must_use]
    pub const fn current(&self) -> Theme {
        self.current
    }

    /// Returns `true` if the visitor has picked a theme.
    pub fn is_manually_set(&self) -> Result<bool, StorageError> {
        Ok(self.store.get(keys::THEME)?.is_some())
    }

    /// Applies and persists `theme`.
    pub fn set(&mut self, theme: Theme) -> Result<Theme, StorageError> {
        self.store.set(keys::THEME, theme.as_str())?;
        self.current = theme;
        tracing::debug!(theme = %theme, "theme set");
        Ok(theme)
    }

    /// Switches to the other theme and persists it.
    pub fn toggle(&mut self) -> Result<Theme, StorageError> {
        self.set(self.current.toggled())
    }

    /// The system colour scheme changed.
    ///
    /// Returns the newly applied theme, or `None` when the visitor's own
    /// choice takes precedence or nothing changed.
    pub fn on_system_change(&mut self, prefers_dark: bool) -> Result<Option<Theme>, StorageError> {
        if self.is_manually_set()? {
            return Ok(None);
        }
        let theme = Theme::from_preference(prefers_dark);
        if theme == self.current {
            return Ok(None);
        }
        self.current = theme;
        Ok(Some(theme))
    }
}
