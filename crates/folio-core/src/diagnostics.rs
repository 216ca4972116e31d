//! Client error bookkeeping and error-page routing.
//!
//! Failures that should take the visitor to a static error page go through
//! [`ErrorRouter`], which stores context for the destination page and makes
//! the redirect one-shot per page load. Anything worth keeping for debugging
//! goes into the bounded [`ErrorLog`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{SharedStore, StorageError, keys, read_json, write_json};

/// Entries kept in the client error log.
pub const ERROR_LOG_CAPACITY: usize = 10;

/// Delay between deciding to redirect and navigating.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(100);

/// Inline placeholder for images that fail to load.
pub const IMAGE_PLACEHOLDER: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjAwIiBoZWlnaHQ9IjE1MCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj4KICA8cmVjdCB3aWR0aD0iMTAwJSIgaGVpZ2h0PSIxMDAlIiBmaWxsPSIjZGRkIi8+CiAgPHRleHQgeD0iNTAlIiB5PSI1MCUiIGZvbnQtZmFtaWx5PSJBcmlhbCIgZm9udC1zaXplPSIxNCIgZmlsbD0iIzk5OSIgdGV4dC1hbmNob3I9Im1pZGRsZSIgZHk9Ii4zZW0iPkltYWdlIG5vdCBmb3VuZDwvdGV4dD4KPC9zdmc+";

/// Alt text set on a replaced image.
pub const IMAGE_PLACEHOLDER_ALT: &str = "Imagen no disponible";

const MINOR_ERRORS: [&str; 3] = ["Script error", "ResizeObserver loop", "Loading CSS"];

/// Returns `true` for runtime errors that are logged but never redirect.
#[must_use]
pub fn is_minor_error(message: &str) -> bool {
    MINOR_ERRORS.iter().any(|minor| message.contains(minor))
}

/// Static error pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorPage {
    /// 400.
    BadRequest,
    /// 403.
    Forbidden,
    /// 404.
    NotFound,
    /// 500, 502 and 503.
    ServerError,
    /// The browser is offline.
    Offline,
    /// Planned downtime.
    Maintenance,
    /// Everything else.
    Generic,
}

impl ErrorPage {
    /// Page for an HTTP status.
    #[must_use]
    pub const fn for_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500 | 502 | 503 => Self::ServerError,
            _ => Self::Generic,
        }
    }

    /// Site-relative path of the page.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::BadRequest => "/errors/400.html",
            Self::Forbidden => "/errors/403.html",
            Self::NotFound => "/errors/404.html",
            Self::ServerError => "/errors/500.html",
            Self::Offline => "/errors/offline.html",
            Self::Maintenance => "/errors/maintenance.html",
            Self::Generic => "/errors/error.html",
        }
    }

    /// Type label stored in `lastError`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BadRequest => "400",
            Self::Forbidden => "403",
            Self::NotFound => "404",
            Self::ServerError => "500",
            Self::Offline => "OFFLINE",
            Self::Maintenance => "MAINTENANCE",
            Self::Generic => "GENERIC",
        }
    }
}

/// Context saved for the error page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Page label (`"404"`, `"OFFLINE"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form diagnostic detail.
    pub data: serde_json::Value,
    /// When the redirect was decided.
    pub timestamp: DateTime<Utc>,
    /// The page the visitor was on.
    pub url: String,
    /// The visitor's user agent.
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

/// A navigation the host should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target path.
    pub path: &'static str,
    /// Wait this long before navigating.
    pub delay: Duration,
}

/// Maps failures to error pages, at most once per page load.
pub struct ErrorRouter {
    session: SharedStore,
    page_url: String,
    user_agent: String,
}

impl ErrorRouter {
    /// Creates a router writing to session storage.
    #[must_use]
    pub fn new(session: SharedStore, page_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            session,
            page_url: page_url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Clears the one-shot redirect flag. Called once per page load.
    pub fn on_page_load(&self) -> Result<(), StorageError> {
        self.session.remove(keys::ERROR_REDIRECTED)
    }

    /// Whether a redirect already happened during this page load.
    pub fn already_redirected(&self) -> Result<bool, StorageError> {
        Ok(self.session.get(keys::ERROR_REDIRECTED)?.as_deref() == Some("true"))
    }

    /// Records context and returns the redirect, unless one already happened.
    pub fn redirect(
        &self,
        page: ErrorPage,
        data: serde_json::Value,
    ) -> Result<Option<Redirect>, StorageError> {
        if self.already_redirected()? {
            tracing::debug!(page = page.label(), "redirect suppressed, already redirected");
            return Ok(None);
        }

        let context = ErrorContext {
            kind: page.label().to_string(),
            data,
            timestamp: Utc::now(),
            url: self.page_url.clone(),
            user_agent: self.user_agent.clone(),
        };
        write_json(self.session.as_ref(), keys::LAST_ERROR, &context)?;
        self.session.set(keys::ERROR_REDIRECTED, "true")?;

        tracing::warn!(page = page.label(), path = page.path(), "redirecting to error page");
        Ok(Some(Redirect {
            path: page.path(),
            delay: REDIRECT_DELAY,
        }))
    }

    /// Routes a non-2xx HTTP response.
    pub fn route_status(&self, status: u16, url: &str) -> Result<Option<Redirect>, StorageError> {
        self.redirect(
            ErrorPage::for_status(status),
            serde_json::json!({ "url": url, "status": status }),
        )
    }

    /// Routes a request that never got a response.
    pub fn route_network_error(
        &self,
        online: bool,
        message: &str,
    ) -> Result<Option<Redirect>, StorageError> {
        if online {
            self.redirect(
                ErrorPage::Generic,
                serde_json::json!({ "error": message, "type": "NETWORK_ERROR" }),
            )
        } else {
            self.redirect(ErrorPage::Offline, serde_json::json!({ "error": message }))
        }
    }

    /// Routes an uncaught runtime error. Minor errors never redirect.
    pub fn route_runtime_error(&self, message: &str) -> Result<Option<Redirect>, StorageError> {
        if is_minor_error(message) {
            tracing::debug!(message, "minor runtime error ignored");
            return Ok(None);
        }
        self.redirect(ErrorPage::ServerError, serde_json::json!({ "error": message }))
    }

    /// Context left by the last redirect.
    pub fn last_error(&self) -> Result<Option<ErrorContext>, StorageError> {
        read_json(self.session.as_ref(), keys::LAST_ERROR)
    }

    /// Drops the stored context once the error page has shown it.
    pub fn clear_last_error(&self) -> Result<(), StorageError> {
        self.session.remove(keys::LAST_ERROR)
    }
}

impl std::fmt::Debug for ErrorRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRouter")
            .field("page_url", &self.page_url)
            .finish_non_exhaustive()
    }
}

/// One entry of the client error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientError {
    /// Error class, e.g. `PROMISE_REJECTION`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Diagnostic detail.
    pub detail: String,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Bounded log of client errors in local storage.
pub struct ErrorLog {
    local: SharedStore,
    capacity: usize,
}

impl ErrorLog {
    /// Creates a log holding the last [`ERROR_LOG_CAPACITY`] entries.
    #[must_use]
    pub fn new(local: SharedStore) -> Self {
        Self::with_capacity(local, ERROR_LOG_CAPACITY)
    }

    /// Creates a log holding the last `capacity` entries.
    #[must_use]
    pub fn with_capacity(local: SharedStore, capacity: usize) -> Self {
        Self { local, capacity }
    }

    /// Appends an entry, dropping the oldest beyond capacity.
    pub fn record(&self, kind: &str, detail: impl Into<String>) -> Result<(), StorageError> {
        let mut entries = self.entries()?;
        entries.push(ClientError {
            kind: kind.to_string(),
            detail: detail.into(),
            timestamp: Utc::now(),
        });
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        write_json(self.local.as_ref(), keys::CLIENT_ERRORS, &entries)
    }

    /// Stored entries, oldest first.
    pub fn entries(&self) -> Result<Vec<ClientError>, StorageError> {
        Ok(read_json(self.local.as_ref(), keys::CLIENT_ERRORS)?.unwrap_or_default())
    }

    /// Removes every entry.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.local.remove(keys::CLIENT_ERRORS)
    }
}

impl std::fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLog")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Kind of a page resource that failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `<img>`.
    Image,
    /// `<script>`.
    Script,
    /// `<link rel="stylesheet">`.
    Stylesheet,
}

/// What to do about a failed resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRecovery {
    /// Swap in the placeholder image.
    Placeholder {
        /// Replacement `src`.
        src: &'static str,
        /// Replacement `alt`.
        alt: &'static str,
    },
    /// Nothing to swap in; the failure was only logged.
    LogOnly,
}

/// Handles a resource load failure. It never reaches the contact pipeline.
#[must_use]
pub fn recover_resource(kind: ResourceKind, source: &str) -> ResourceRecovery {
    tracing::warn!(?kind, source, "resource failed to load");
    match kind {
        ResourceKind::Image => ResourceRecovery::Placeholder {
            src: IMAGE_PLACEHOLDER,
            alt: IMAGE_PLACEHOLDER_ALT,
        },
        ResourceKind::Script | ResourceKind::Stylesheet => ResourceRecovery::LogOnly,
    }
}
