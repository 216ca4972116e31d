//! Contact form field validation.
//!
//! Validation is pure: [`Validator::validate`] maps a field kind and a raw
//! value to a [`ValidationResult`] and never panics. Values are trimmed before
//! every check.

mod meter;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use self::meter::{MeterLevel, MeterReading, MessageMeter};
use crate::form::{CANONICAL_FIELDS, FormSnapshot};

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{00FF}\s]+$")
        .expect("invalid name pattern")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("invalid email pattern")
});

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(https?://|www\.)\S+").expect("invalid link pattern"));

/// The kind of a form field, which selects its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Sender's name.
    Name,
    /// Sender's reply-to address.
    Email,
    /// Subject selection.
    Subject,
    /// Message body.
    Message,
    /// Any other required field.
    Other,
}

impl FieldKind {
    /// Maps a form field name to its kind.
    #[must_use]
    pub fn from_field_name(name: &str) -> Self {
        match name {
            "name" => Self::Name,
            "email" => Self::Email,
            "subject" => Self::Subject,
            "message" => Self::Message,
            _ => Self::Other,
        }
    }
}

/// Upper bound on message length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLimit {
    /// At most this many characters.
    Characters(usize),
    /// At most this many whitespace-separated words.
    Words(usize),
}

impl MessageLimit {
    /// The configured maximum.
    #[must_use]
    pub const fn max(&self) -> usize {
        match self {
            Self::Characters(n) | Self::Words(n) => *n,
        }
    }

    /// Measures `text` in this limit's unit.
    #[must_use]
    pub fn measure(&self, text: &str) -> usize {
        match self {
            Self::Characters(_) => text.chars().count(),
            Self::Words(_) => text.split_whitespace().count(),
        }
    }

    /// Unit label used in counters and messages.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Characters(_) => "characters",
            Self::Words(_) => "words",
        }
    }
}

impl Default for MessageLimit {
    fn default() -> Self {
        Self::Characters(1000)
    }
}

/// Field validation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Minimum trimmed name length, in characters.
    #[serde(default = "default_min_name_length")]
    pub min_name_length: usize,

    /// Maximum trimmed name length, in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,

    /// Maximum email length, in characters.
    #[serde(default = "default_max_email_length")]
    pub max_email_length: usize,

    /// Minimum trimmed message length, in characters.
    #[serde(default = "default_min_message_length")]
    pub min_message_length: usize,

    /// Upper bound on the message.
    #[serde(default)]
    pub message_limit: MessageLimit,

    /// Accepted subject values. Empty accepts any non-empty value.
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,
}

const fn default_min_name_length() -> usize {
    2
}

const fn default_max_name_length() -> usize {
    100
}

const fn default_max_email_length() -> usize {
    254
}

const fn default_min_message_length() -> usize {
    10
}

fn default_subjects() -> Vec<String> {
    [
        "general",
        "project",
        "consulting",
        "security-audit",
        "job-offer",
        "other",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_name_length: default_min_name_length(),
            max_name_length: default_max_name_length(),
            max_email_length: default_max_email_length(),
            min_message_length: default_min_message_length(),
            message_limit: MessageLimit::default(),
            subjects: default_subjects(),
        }
    }
}

/// Result of validating a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the value passed.
    pub valid: bool,
    /// User-facing reason when it did not.
    pub message: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// A failing result with a user-facing message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// A single failing field in a [`FormVerdict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name.
    pub field: String,
    /// User-facing message.
    pub message: String,
}

/// Aggregate validation result for a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormVerdict {
    /// Whether every field passed.
    pub valid: bool,
    /// Failing fields in canonical order.
    pub field_errors: Vec<FieldError>,
}

impl FormVerdict {
    /// Message for `field`, if it failed.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// First failing field in canonical order.
    #[must_use]
    pub fn first_invalid(&self) -> Option<&str> {
        self.field_errors.first().map(|e| e.field.as_str())
    }
}

/// Validates contact form fields against a [`ValidationConfig`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Creates a validator with the given rules.
    #[must_use]
    pub const fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Returns the validation rules.
    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// A counter for the message field under the configured limit.
    #[must_use]
    pub const fn meter(&self) -> MessageMeter {
        MessageMeter::new(self.config.message_limit)
    }

    /// Validates a raw value for `kind`.
    #[must_use]
    pub fn validate(&self, kind: FieldKind, raw: &str) -> ValidationResult {
        let value = raw.trim();
        if value.is_empty() {
            return ValidationResult::invalid("This field is required");
        }

        match kind {
            FieldKind::Name => self.validate_name(value),
            FieldKind::Email => self.validate_email(value),
            FieldKind::Subject => self.validate_subject(value),
            FieldKind::Message => self.validate_message(value),
            FieldKind::Other => ValidationResult::ok(),
        }
    }

    /// Validates the named field.
    #[must_use]
    pub fn validate_field(&self, field: &str, raw: &str) -> ValidationResult {
        self.validate(FieldKind::from_field_name(field), raw)
    }

    /// Validates the required fields of `snapshot` in canonical order.
    ///
    /// A field missing from the snapshot is treated as empty.
    #[must_use]
    pub fn validate_form(&self, snapshot: &FormSnapshot) -> FormVerdict {
        let field_errors: Vec<FieldError> = CANONICAL_FIELDS
            .iter()
            .filter_map(|&field| {
                let result = self.validate_field(field, snapshot.get(field).unwrap_or(""));
                if result.valid {
                    return None;
                }
                Some(FieldError {
                    field: field.to_string(),
                    message: result.message.unwrap_or_default(),
                })
            })
            .collect();

        FormVerdict {
            valid: field_errors.is_empty(),
            field_errors,
        }
    }

    fn validate_name(&self, value: &str) -> ValidationResult {
        let len = value.chars().count();
        if len < self.config.min_name_length {
            return ValidationResult::invalid(format!(
                "Name must be at least {} characters",
                self.config.min_name_length
            ));
        }
        if len > self.config.max_name_length {
            return ValidationResult::invalid(format!(
                "Name must be at most {} characters",
                self.config.max_name_length
            ));
        }
        if !NAME_PATTERN.is_match(value) {
            return ValidationResult::invalid("Name may only contain letters and spaces");
        }
        ValidationResult::ok()
    }

    fn validate_email(&self, value: &str) -> ValidationResult {
        if value.chars().count() > self.config.max_email_length {
            return ValidationResult::invalid("Email address is too long");
        }
        if !EMAIL_PATTERN.is_match(&value.to_lowercase()) {
            return ValidationResult::invalid("Please enter a valid email address");
        }
        ValidationResult::ok()
    }

    fn validate_subject(&self, value: &str) -> ValidationResult {
        if !self.config.subjects.is_empty() && !self.config.subjects.iter().any(|s| s == value) {
            return ValidationResult::invalid("Please select a subject");
        }
        ValidationResult::ok()
    }

    fn validate_message(&self, value: &str) -> ValidationResult {
        if value.chars().count() < self.config.min_message_length {
            return ValidationResult::invalid(format!(
                "Message must be at least {} characters",
                self.config.min_message_length
            ));
        }
        let limit = self.config.message_limit;
        if limit.measure(value) > limit.max() {
            return ValidationResult::invalid(format!(
                "Message must be at most {} {}",
                limit.max(),
                limit.unit()
            ));
        }
        if LINK_PATTERN.is_match(value) {
            return ValidationResult::invalid("Links are not allowed in the message");
        }
        ValidationResult::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::default()
    }

    #[test]
    fn test_email_examples() {
        let v = validator();
        assert!(!v.validate(FieldKind::Email, "not-an-email").valid);
        assert!(v.validate(FieldKind::Email, "a@b.co").valid);
        assert!(v.validate(FieldKind::Email, "  Ana.Perez+web@Example.COM ").valid);
        assert!(!v.validate(FieldKind::Email, "a@-b.co").valid);
        assert!(!v.validate(FieldKind::Email, "a b@c.co").valid);
    }

    #[test]
    fn test_email_length_cap() {
        let v = validator();
        let local = "a".repeat(64);
        let domain = format!("{}.com", "b".repeat(60));
        let long = format!("{local}@{domain}.{domain}.{domain}");
        assert!(long.len() > 254);
        assert!(!v.validate(FieldKind::Email, &long).valid);
    }

    #[test]
    fn test_name_rules() {
        let v = validator();
        assert!(v.validate(FieldKind::Name, "José Núñez").valid);
        assert!(v.validate(FieldKind::Name, "Zoë Ångström").valid);
        assert!(!v.validate(FieldKind::Name, "A").valid);
        assert!(!v.validate(FieldKind::Name, " A ").valid);
        assert!(!v.validate(FieldKind::Name, "R2-D2").valid);
        assert!(v.validate(FieldKind::Name, &"a".repeat(100)).valid);
        assert!(!v.validate(FieldKind::Name, &"a".repeat(101)).valid);
    }

    #[test]
    fn test_message_boundary_characters() {
        let v = validator();
        assert!(v.validate(FieldKind::Message, &"x".repeat(1000)).valid);
        assert!(!v.validate(FieldKind::Message, &"x".repeat(1001)).valid);
        assert!(v.validate(FieldKind::Message, &"x".repeat(10)).valid);
        assert!(!v.validate(FieldKind::Message, &"x".repeat(9)).valid);
    }

    #[test]
    fn test_message_boundary_words() {
        let v = Validator::new(ValidationConfig {
            message_limit: MessageLimit::Words(500),
            ..Default::default()
        });
        let exact = vec!["word"; 500].join(" ");
        let over = vec!["word"; 501].join(" ");
        assert!(v.validate(FieldKind::Message, &exact).valid);
        let result = v.validate(FieldKind::Message, &over);
        assert!(!result.valid);
        assert_eq!(result.message.as_deref(), Some("Message must be at most 500 words"));
    }

    #[test]
    fn test_message_rejects_links() {
        let v = validator();
        let result = v.validate(FieldKind::Message, "Great deals at https://spam.biz/x today");
        assert!(!result.valid);
        assert_eq!(result.message.as_deref(), Some("Links are not allowed in the message"));
        assert!(!v.validate(FieldKind::Message, "See www.example.com for details").valid);
        assert!(v.validate(FieldKind::Message, "Email me about the http protocol, please.").valid);
    }

    #[test]
    fn test_subject_must_be_listed() {
        let v = validator();
        assert!(v.validate(FieldKind::Subject, "consulting").valid);
        assert!(!v.validate(FieldKind::Subject, "lottery").valid);
        assert!(!v.validate(FieldKind::Subject, "").valid);
    }

    #[test]
    fn test_other_fields_only_require_content() {
        let v = validator();
        assert!(v.validate(FieldKind::Other, "anything").valid);
        assert!(!v.validate(FieldKind::Other, "   ").valid);
    }

    #[test]
    fn test_form_verdict_in_canonical_order() {
        let snapshot = FormSnapshot::new()
            .with("message", "short")
            .with("email", "nope")
            .with("name", "Ana");

        let verdict = validator().validate_form(&snapshot);
        assert!(!verdict.valid);
        let fields: Vec<_> = verdict.field_errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["email", "subject", "message"]);
        assert_eq!(verdict.first_invalid(), Some("email"));
        assert!(verdict.error_for("name").is_none());
    }

    #[test]
    fn test_valid_form() {
        let snapshot = FormSnapshot::new()
            .with("name", "Ana Pérez")
            .with("email", "ana@example.com")
            .with("subject", "project")
            .with("message", "I would like to talk about a project.");
        let verdict = validator().validate_form(&snapshot);
        assert!(verdict.valid);
        assert!(verdict.field_errors.is_empty());
    }
}
