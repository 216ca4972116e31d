//! The third-party form relay.
//!
//! The relay accepts a urlencoded POST of the form fields plus a few
//! underscore-prefixed metadata fields and answers with any 2xx on success.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::ACCEPT;
use thiserror::Error;

use crate::config::FormConfig;
use crate::form::{FormSnapshot, HONEYPOT_FIELDS};
use crate::screening;

/// Errors reaching the relay.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RelayError {
    /// No endpoint is configured.
    #[error("relay endpoint not configured")]
    NotConfigured,

    /// The configured endpoint is not a URL.
    #[error("invalid relay endpoint: {0}")]
    InvalidEndpoint(String),

    /// The request did not complete in time.
    #[error("relay request timed out")]
    Timeout,

    /// The request failed before a response arrived.
    #[error("relay transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// The relay's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayResponse {
    /// HTTP status code.
    pub status: u16,
}

impl RelayResponse {
    /// Creates a response with `status`.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self { status }
    }

    /// Any 2xx counts as delivered.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The urlencoded body sent to the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(String, String)>,
}

impl Payload {
    /// Builds the body from the submitted fields plus relay metadata.
    ///
    /// Honeypot fields are not forwarded. Every other value except the
    /// email address goes through [`screening::sanitize`].
    #[must_use]
    pub fn from_snapshot(snapshot: &FormSnapshot, config: &FormConfig) -> Self {
        let mut fields: Vec<(String, String)> = snapshot
            .iter()
            .filter(|(name, _)| !HONEYPOT_FIELDS.contains(name))
            .map(|(name, value)| {
                let value = if name == "email" {
                    value.trim().to_string()
                } else {
                    screening::sanitize(value)
                };
                (name.to_string(), value)
            })
            .collect();

        let subject = match snapshot.get("subject").map(str::trim) {
            Some(topic) if !topic.is_empty() => format!("{}: {topic}", config.subject_line),
            _ => config.subject_line.clone(),
        };
        let reply_to = snapshot.get("email").unwrap_or_default().trim().to_string();

        fields.push(("_subject".to_string(), subject));
        fields.push(("_replyto".to_string(), reply_to));
        fields.push(("_format".to_string(), config.format.clone()));
        Self { fields }
    }

    /// Value of `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// All `(field, value)` pairs in send order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Something that delivers a [`Payload`].
#[async_trait]
pub trait Relay: Send + Sync {
    /// Posts `payload` and returns the relay's status.
    ///
    /// # Errors
    ///
    /// Returns an error when no response was received. A non-2xx response is
    /// an `Ok` with that status.
    async fn post(&self, payload: &Payload) -> Result<RelayResponse, RelayError>;
}

/// A [`Relay`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpRelay {
    /// Creates a relay client for the configured endpoint.
    pub fn new(config: &FormConfig) -> Result<Self, RelayError> {
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(RelayError::NotConfigured);
        }
        let endpoint =
            Url::parse(endpoint).map_err(|e| RelayError::InvalidEndpoint(e.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { endpoint, client })
    }

    /// The endpoint requests go to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn post(&self, payload: &Payload) -> Result<RelayResponse, RelayError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            fields = payload.fields().len(),
            "posting to relay"
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .form(payload.fields())
            .send()
            .await?;
        let status = response.status().as_u16();
        tracing::debug!(status, "relay responded");
        Ok(RelayResponse::new(status))
    }
}
