//! Client-side input screening.
//!
//! Pattern checks, spam scoring, a honeypot check and behavioral scoring.
//! All of it runs in the visitor's browser, where it can be read, patched or
//! skipped. The pipeline uses the results to turn away obvious junk before
//! it reaches the relay; they are never a security decision.

mod behavior;

use std::sync::LazyLock;

use regex::Regex;

pub use self::behavior::{
    BehaviorMonitor, HUMAN_SCORE_THRESHOLD, REPORT_THRESHOLD, ThreatLevel, ThreatStatus,
};
use crate::form::{FormSnapshot, HONEYPOT_FIELDS};

/// Longest value [`sanitize`] returns, in characters.
pub const SANITIZED_MAX_CHARS: usize = 1000;

/// Spam indicator families matched before a message counts as spam.
const SPAM_THRESHOLD: usize = 2;

static SUSPICIOUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<script\b.*?</script>",
        r"(?i)javascript:",
        r"(?i)\bon\w+\s*=",
        r"(?i)expression\s*\(",
        r"\b(SELECT|INSERT|UPDATE|DELETE|DROP|UNION|EXEC)\b",
        r"(--|/\*|\*/)",
        r"(?i)(http|https|ftp|ftps)://[a-zA-Z0-9\-.]+\.[a-zA-Z]{2,3}(/\S*)?",
        r#"(?i)<iframe[^>]+src=["'][^"']*["'][^>]*>"#,
        r#"(?i)<img[^>]+src=["'][^"']*["'][^>]*>"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid suspicious pattern"))
    .collect()
});

static SPAM_INDICATORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)viagra|cialis|pharmacy|drugs",
        r"(?i)casino|poker|betting",
        r"(?i)lottery|prize|winner",
        r"(?i)urgent|important|attention",
        r"(?i)click here|buy now|limited time",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid spam pattern"))
    .collect()
});

static MARKUP_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>&"']"#).expect("invalid markup pattern"));

static SCRIPT_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bon\w+=|\b(javascript|script|alert|document|eval|expression)\b")
        .expect("invalid script word pattern")
});

/// Returns `true` if `input` looks like markup, script, SQL or a link.
#[must_use]
pub fn contains_suspicious_patterns(input: &str) -> bool {
    SUSPICIOUS_PATTERNS.iter().any(|p| p.is_match(input))
}

/// Number of spam indicator families present in `message`.
#[must_use]
pub fn spam_indicators(message: &str) -> usize {
    SPAM_INDICATORS.iter().filter(|p| p.is_match(message)).count()
}

/// Returns `true` if more than two spam indicator families match.
#[must_use]
pub fn detect_spam(message: &str) -> bool {
    spam_indicators(message) > SPAM_THRESHOLD
}

/// Strips markup characters and script keywords, trims, and caps the length.
#[must_use]
pub fn sanitize(input: &str) -> String {
    let stripped = MARKUP_CHARS.replace_all(input, "");
    let stripped = SCRIPT_WORDS.replace_all(&stripped, "");
    stripped.trim().chars().take(SANITIZED_MAX_CHARS).collect()
}

/// Returns `true` if any honeypot field carries a value.
#[must_use]
pub fn honeypot_triggered(snapshot: &FormSnapshot) -> bool {
    HONEYPOT_FIELDS
        .iter()
        .any(|field| snapshot.get(field).is_some_and(|v| !v.trim().is_empty()))
}

/// Summary of the content checks over one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningReport {
    /// Visible fields whose value matched a suspicious pattern.
    pub suspicious_fields: Vec<String>,
    /// Spam indicator families found in the message.
    pub spam_indicators: usize,
    /// Whether a honeypot was filled in.
    pub honeypot: bool,
}

impl ScreeningReport {
    /// Whether the message counts as spam.
    #[must_use]
    pub const fn is_spam(&self) -> bool {
        self.spam_indicators > SPAM_THRESHOLD
    }

    /// Returns `true` if nothing was flagged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.suspicious_fields.is_empty() && !self.is_spam() && !self.honeypot
    }
}

/// Runs every content check over `snapshot`.
#[must_use]
pub fn screen(snapshot: &FormSnapshot) -> ScreeningReport {
    let suspicious_fields = snapshot
        .iter()
        .filter(|(name, _)| !HONEYPOT_FIELDS.contains(name))
        .filter(|(_, value)| contains_suspicious_patterns(value))
        .map(|(name, _)| name.to_string())
        .collect();

    ScreeningReport {
        suspicious_fields,
        spam_indicators: snapshot.get("message").map_or(0, spam_indicators),
        honeypot: honeypot_triggered(snapshot),
    }
}
