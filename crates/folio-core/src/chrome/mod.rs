//! Page chrome: navigation menu, scroll widgets, theme, counters, cookie
//! banner, preloader and the decorative network background.
//!
//! Each widget is a small state machine. The host feeds it events and
//! renders whatever state it reports; none of them touch the form pipeline.

mod cookies;
mod counters;
mod menu;
mod network;
mod preloader;
mod scroll;
mod theme;

pub use self::cookies::{COOKIE_BANNER_DELAY, CookieConsent};
pub use self::counters::{AnimatedCounters, COUNTER_DURATION, Counter, ease_out_quart};
pub use self::menu::{MOBILE_BREAKPOINT, MobileMenu};
pub use self::network::{Connection, ConnectionGeometry, NetworkAnimation, Node};
pub use self::preloader::{PRELOADER_DELAY, PRELOADER_FADE, Preloader, PreloaderPhase};
pub use self::scroll::{BACK_TO_TOP_THRESHOLD, BackToTop, PROGRESS_THROTTLE, ScrollProgress};
pub use self::theme::{Theme, ThemeManager};
