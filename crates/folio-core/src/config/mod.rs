//! Configuration parsing and management.
//!
//! A site is described by a single TOML file. Every section is optional and
//! falls back to the values the contact page ships with, so an empty file (or
//! no file at all) yields a working configuration pointed at no relay.
//!
//! ```toml
//! [form]
//! endpoint = "https://formsubmit.co/ajax/someone@example.com"
//!
//! [rate_limit]
//! max_attempts = 5
//! window = "15m"
//! penalty = "1h"
//!
//! [retry]
//! max_retries = 3
//! backoff = { type = "fixed", delay = "1s" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rate_limit::RateLimitConfig;
use crate::submission::BackoffConfig;
use crate::validation::ValidationConfig;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`SiteConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration parsed but holds unusable values.
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Top-level site configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Contact form and relay settings.
    #[serde(default)]
    pub form: FormConfig,

    /// Client-side submission throttling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry behavior for relay failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Status banner timings.
    #[serde(default)]
    pub notices: NoticeConfig,

    /// Field validation rules.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Local/session storage location.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl SiteConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "rate_limit.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.window.is_zero() {
            return Err(ConfigError::Validation(
                "rate_limit.window must be non-zero".to_string(),
            ));
        }
        if self.rate_limit.max_tracked_identifiers == 0 {
            return Err(ConfigError::Validation(
                "rate_limit.max_tracked_identifiers must be at least 1".to_string(),
            ));
        }
        if self.validation.min_message_length > self.validation.message_limit.max() {
            return Err(ConfigError::Validation(format!(
                "validation.min_message_length ({}) exceeds the message limit ({})",
                self.validation.min_message_length,
                self.validation.message_limit.max()
            )));
        }
        if !self.form.endpoint.is_empty() && reqwest::Url::parse(&self.form.endpoint).is_err() {
            return Err(ConfigError::Validation(format!(
                "form.endpoint is not a valid URL: {}",
                self.form.endpoint
            )));
        }
        Ok(())
    }
}

/// Contact form and relay settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    /// The form's action URL on the third-party relay.
    #[serde(default)]
    pub endpoint: String,

    /// Prefix for the injected `_subject` field.
    #[serde(default = "default_subject_line")]
    pub subject_line: String,

    /// Value of the injected `_format` field.
    #[serde(default = "default_format")]
    pub format: String,

    /// Per-request timeout for relay calls.
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_subject_line() -> String {
    "New message from the portfolio".to_string()
}

fn default_format() -> String {
    "plain".to_string()
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            subject_line: default_subject_line(),
            format: default_format(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry behavior for relay failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Failed sends tolerated before the run is terminal.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between a failed send and the next one.
    #[serde(default)]
    pub backoff: BackoffConfig,
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Status banner timings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NoticeConfig {
    /// How long a success banner stays up.
    #[serde(default = "default_success_ttl")]
    #[serde(with = "humantime_serde")]
    pub success_ttl: Duration,

    /// How long a warning banner stays up.
    #[serde(default = "default_warning_ttl")]
    #[serde(with = "humantime_serde")]
    pub warning_ttl: Duration,
}

const fn default_success_ttl() -> Duration {
    Duration::from_secs(5)
}

const fn default_warning_ttl() -> Duration {
    Duration::from_secs(8)
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            success_ttl: default_success_ttl(),
            warning_ttl: default_warning_ttl(),
        }
    }
}

/// Where the CLI keeps its local/session storage files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding `local.json` and `session.json`.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".folio")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

/// Serde adapter for human-readable durations (`"1s"`, `"15m"`).
pub(crate) mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::MessageLimit;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SiteConfig::from_toml("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.rate_limit.max_attempts, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(15 * 60));
        assert_eq!(config.rate_limit.penalty, Duration::from_secs(60 * 60));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(
            config.retry.backoff,
            BackoffConfig::Fixed {
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(config.notices.success_ttl, Duration::from_secs(5));
        assert_eq!(config.notices.warning_ttl, Duration::from_secs(8));
        assert_eq!(config.form.format, "plain");
    }

    #[test]
    fn test_parses_humantime_durations() {
        let config = SiteConfig::from_toml(
            r#"
            [form]
            endpoint = "https://relay.example.com/ajax/me@example.com"
            request_timeout = "30s"

            [rate_limit]
            max_attempts = 3
            window = "5m"
            penalty = "2h"

            [retry]
            max_retries = 2
            backoff = { type = "linear", initial_delay = "500ms", increment = "1s", max_delay = "5s" }

            [validation]
            message_limit = { words = 500 }
            "#,
        )
        .unwrap();

        assert_eq!(config.form.request_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit.max_attempts, 3);
        assert_eq!(config.rate_limit.window, Duration::from_secs(300));
        assert_eq!(config.rate_limit.penalty, Duration::from_secs(7200));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.validation.message_limit, MessageLimit::Words(500));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = SiteConfig::from_toml("[form]\nendpont = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let err = SiteConfig::from_toml("[rate_limit]\nmax_attempts = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let err = SiteConfig::from_toml("[form]\nendpoint = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_toml_round_trip_preserves_config() {
        let mut config = SiteConfig::default();
        config.form.endpoint = "https://relay.example.com/f/abc".to_string();
        config.retry.max_retries = 5;

        let text = config.to_toml().unwrap();
        let parsed = SiteConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, SiteConfig::default());
    }
}
