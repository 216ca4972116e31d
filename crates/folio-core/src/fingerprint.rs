//! Coarse client fingerprint used as the rate-limit identifier.
//!
//! The fingerprint is a 32-bit hash of a handful of browser traits. Many
//! visitors share one, and any visitor can change theirs. It groups attempts
//! for throttling; it identifies and authenticates nobody.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Browser traits folded into the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTraits {
    /// `navigator.userAgent`.
    pub user_agent: String,
    /// `navigator.language`.
    pub language: String,
    /// `screen.colorDepth`.
    pub color_depth: u32,
    /// `screen.width`.
    pub screen_width: u32,
    /// `screen.height`.
    pub screen_height: u32,
    /// Minutes behind UTC, as `Date.getTimezoneOffset()` reports it.
    pub timezone_offset: i32,
    /// `navigator.cookieEnabled`.
    pub cookies_enabled: bool,
    /// `navigator.javaEnabled()`.
    pub java_enabled: bool,
    /// `navigator.platform`.
    pub platform: String,
}

impl Default for ClientTraits {
    fn default() -> Self {
        Self {
            user_agent: concat!("folio/", env!("CARGO_PKG_VERSION")).to_string(),
            language: "en-US".to_string(),
            color_depth: 24,
            screen_width: 1920,
            screen_height: 1080,
            timezone_offset: 0,
            cookies_enabled: true,
            java_enabled: false,
            platform: std::env::consts::OS.to_string(),
        }
    }
}

impl ClientTraits {
    /// The `|`-joined trait string that gets hashed.
    #[must_use]
    pub fn components(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "{}|{}|{}|{}x{}|{}|{}|{}|{}",
            self.user_agent,
            self.language,
            self.color_depth,
            self.screen_width,
            self.screen_height,
            self.timezone_offset,
            self.cookies_enabled,
            self.java_enabled,
            self.platform,
        );
        out
    }

    /// The fingerprint of these traits.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hash_hex(&self.components())
    }
}

/// 32-bit shift-subtract string hash over UTF-16 code units.
#[must_use]
pub fn hash32(input: &str) -> i32 {
    input.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// [`hash32`] as signed lowercase hex (`"-1a2b"` for negative values).
#[must_use]
pub fn hash_hex(input: &str) -> String {
    let hash = i64::from(hash32(input));
    if hash < 0 {
        format!("-{:x}", -hash)
    } else {
        format!("{hash:x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hashes() {
        assert_eq!(hash32(""), 0);
        assert_eq!(hash32("a"), 97);
        // 97 * 31 + 98
        assert_eq!(hash32("ab"), 3105);
        assert_eq!(hash_hex("ab"), "c21");
        assert_eq!(hash32("hello world"), 1_794_106_052);
        // Wraps into the negative range.
        assert_eq!(hash32("fingerprint"), -1_375_934_236);
        assert_eq!(hash_hex("fingerprint"), "-5203171c");
    }

    #[test]
    fn test_components_layout() {
        let traits = ClientTraits {
            user_agent: "UA".into(),
            language: "es-ES".into(),
            color_depth: 24,
            screen_width: 1280,
            screen_height: 720,
            timezone_offset: -60,
            cookies_enabled: true,
            java_enabled: false,
            platform: "Linux x86_64".into(),
        };
        assert_eq!(
            traits.components(),
            "UA|es-ES|24|1280x720|-60|true|false|Linux x86_64"
        );
        assert_eq!(traits.fingerprint(), hash_hex(&traits.components()));
    }

    #[test]
    fn test_fingerprint_changes_with_traits() {
        let a = ClientTraits::default();
        let b = ClientTraits {
            screen_width: 1366,
            ..ClientTraits::default()
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
