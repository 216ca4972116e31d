//! Page-level wiring.
//!
//! [`Site::new`] builds every service once and starts the background timers.
//! Everything that used to be a page global is a field here, and dropping the
//! site stops its timers.
//!
//! Page events enter through the `on_*` hooks: interaction events feed the
//! [`BehaviorMonitor`], whose findings count as violations against the form,
//! and runtime or resource failures go to the error log and router.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::chrome::{CookieConsent, ThemeManager};
use crate::config::{ConfigError, SiteConfig};
use crate::diagnostics::{
    ErrorLog, ErrorRouter, Redirect, ResourceKind, ResourceRecovery, is_minor_error,
    recover_resource,
};
use crate::fingerprint::ClientTraits;
use crate::notify::{SharedRegion, StatusNotifier};
use crate::presenter::SharedForm;
use crate::rate_limit::RateLimiter;
use crate::schedule::{PageClock, ScheduledTask, Scheduler};
use crate::screening::{BehaviorMonitor, ThreatLevel};
use crate::session;
use crate::storage::{SharedStore, StorageError};
use crate::submission::{Relay, SubmissionPipeline, SubmissionReport};

/// Interval between behavior scans.
pub const BEHAVIOR_SCAN_INTERVAL: Duration = Duration::from_secs(10);

/// Errors building a [`Site`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SiteError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local or session storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The host environment a [`Site`] runs in.
pub struct SiteEnvironment {
    /// Persistent storage.
    pub local: SharedStore,
    /// Per-visit storage.
    pub session: SharedStore,
    /// The contact form.
    pub form: SharedForm,
    /// The form's status region.
    pub region: SharedRegion,
    /// Where submissions are posted.
    pub relay: Arc<dyn Relay>,
    /// Browser traits for the fingerprint.
    pub client: ClientTraits,
    /// Address of the current page.
    pub page_url: String,
    /// Whether the system colour scheme is dark.
    pub prefers_dark: bool,
    /// Runtime for timers.
    pub scheduler: Scheduler,
}

impl fmt::Debug for SiteEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteEnvironment")
            .field("page_url", &self.page_url)
            .field("prefers_dark", &self.prefers_dark)
            .finish_non_exhaustive()
    }
}

/// All page services, built once.
pub struct Site {
    config: SiteConfig,
    fingerprint: String,
    session_id: String,
    limiter: Arc<RateLimiter>,
    threat: Arc<ThreatLevel>,
    behavior: Arc<Mutex<BehaviorMonitor>>,
    clock: PageClock,
    error_log: Arc<ErrorLog>,
    router: Arc<ErrorRouter>,
    pipeline: Arc<SubmissionPipeline>,
    theme: ThemeManager,
    cookies: Arc<Mutex<CookieConsent>>,
    tasks: Vec<ScheduledTask>,
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("fingerprint", &self.fingerprint)
            .field("session_id", &self.session_id)
            .field("theme", &self.theme)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl Site {
    /// Builds the services and starts the limiter cleanup, behavior scan and
    /// cookie banner timers.
    pub fn new(config: SiteConfig, env: SiteEnvironment) -> Result<Self, SiteError> {
        config.validate()?;

        let SiteEnvironment {
            local,
            session,
            form,
            region,
            relay,
            client,
            page_url,
            prefers_dark,
            scheduler,
        } = env;

        let clock = PageClock::start();
        let router = Arc::new(ErrorRouter::new(
            Arc::clone(&session),
            page_url,
            client.user_agent.clone(),
        ));
        router.on_page_load()?;
        let session_id = session::session_id(session.as_ref())?;
        let fingerprint = client.fingerprint();

        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        let threat = Arc::new(ThreatLevel::default());
        let behavior = Arc::new(Mutex::new(BehaviorMonitor::new()));
        let error_log = Arc::new(ErrorLog::new(Arc::clone(&local)));
        let notifier = Arc::new(StatusNotifier::new(region, config.notices, scheduler.clone()));

        let pipeline = Arc::new(
            SubmissionPipeline::new(
                &config,
                form,
                notifier,
                Arc::clone(&limiter),
                relay,
                fingerprint.clone(),
            )
            .with_error_log(Arc::clone(&error_log))
            .with_threat_level(Arc::clone(&threat))
            .with_behavior(Arc::clone(&behavior), clock)
            .with_error_router(Arc::clone(&router)),
        );

        let theme = ThemeManager::load(Arc::clone(&local), prefers_dark)?;
        let cookies = Arc::new(Mutex::new(CookieConsent::load(local)?));

        let mut tasks = Vec::with_capacity(3);

        let cleanup_limiter = Arc::clone(&limiter);
        tasks.push(scheduler.every(config.rate_limit.cleanup_interval, move || {
            cleanup_limiter.cleanup();
        }));

        let scan_behavior = Arc::clone(&behavior);
        let scan_pipeline = Arc::clone(&pipeline);
        tasks.push(scheduler.every(BEHAVIOR_SCAN_INTERVAL, move || {
            let flagged = scan_behavior
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .scan();
            if flagged.is_some() {
                scan_pipeline.report_violation("suspicious interaction pattern");
            }
        }));

        let banner_delay = cookies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .banner_delay();
        if let Some(delay) = banner_delay {
            let banner = Arc::clone(&cookies);
            tasks.push(scheduler.after(delay, async move {
                banner
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .show();
            }));
        }

        tracing::info!(
            session_id = %session_id,
            fingerprint = %fingerprint,
            theme = %theme.current(),
            "site initialized"
        );

        Ok(Self {
            config,
            fingerprint,
            session_id,
            limiter,
            threat,
            behavior,
            clock,
            error_log,
            router,
            pipeline,
            theme,
            cookies,
            tasks,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Rate-limit identifier of this visitor.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Session token of this visit.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The shared rate limiter.
    #[must_use]
    pub const fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// The form's violation counter.
    #[must_use]
    pub const fn threat(&self) -> &Arc<ThreatLevel> {
        &self.threat
    }

    /// The interaction monitor fed by page events.
    #[must_use]
    pub const fn behavior(&self) -> &Arc<Mutex<BehaviorMonitor>> {
        &self.behavior
    }

    /// The client error log.
    #[must_use]
    pub const fn error_log(&self) -> &Arc<ErrorLog> {
        &self.error_log
    }

    /// The error page router.
    #[must_use]
    pub const fn router(&self) -> &Arc<ErrorRouter> {
        &self.router
    }

    /// The contact form pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Arc<SubmissionPipeline> {
        &self.pipeline
    }

    /// The theme manager.
    #[must_use]
    pub const fn theme(&self) -> &ThemeManager {
        &self.theme
    }

    /// The theme manager, for toggling.
    pub const fn theme_mut(&mut self) -> &mut ThemeManager {
        &mut self.theme
    }

    /// The cookie banner.
    #[must_use]
    pub const fn cookies(&self) -> &Arc<Mutex<CookieConsent>> {
        &self.cookies
    }

    /// Submits the contact form.
    pub async fn submit(&self) -> SubmissionReport {
        self.pipeline.submit().await
    }

    fn monitor(&self) -> std::sync::MutexGuard<'_, BehaviorMonitor> {
        self.behavior
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Pointer moved.
    pub fn on_pointer_move(&self, x: f64, y: f64) {
        self.monitor().record_pointer(x, y);
    }

    /// Page scrolled to `offset`.
    pub fn on_scroll(&self, offset: f64) {
        let at_ms = self.clock.now_ms();
        self.monitor().record_scroll(offset, at_ms);
    }

    /// A form field gained focus. Only the first focus is kept.
    pub fn on_form_focus(&self) {
        let at_ms = self.clock.now_ms();
        self.monitor().form_started(at_ms);
    }

    /// Key pressed. A burst of near-instant keystrokes counts as a violation.
    pub fn on_keystroke(&self) {
        let at_ms = self.clock.now_ms();
        let rapid = self.monitor().record_keystroke(at_ms);
        if rapid {
            self.pipeline.report_violation("rapid typing");
        }
    }

    /// An uncaught runtime error.
    ///
    /// Minor errors are ignored. Anything else is logged and may route to the
    /// server error page once per page load.
    pub fn on_runtime_error(&self, message: &str) -> Option<Redirect> {
        if is_minor_error(message) {
            tracing::debug!(message, "minor runtime error ignored");
            return None;
        }
        if let Err(e) = self.error_log.record("RUNTIME_ERROR", message) {
            tracing::warn!(error = %e, "failed to record client error");
        }
        self.router.route_runtime_error(message).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to record error context");
            None
        })
    }

    /// A page resource failed to load.
    pub fn on_resource_error(&self, kind: ResourceKind, source: &str) -> ResourceRecovery {
        if let Err(e) = self.error_log.record("RESOURCE_ERROR", format!("{kind:?}: {source}")) {
            tracing::warn!(error = %e, "failed to record client error");
        }
        recover_resource(kind, source)
    }

    /// Stops the background timers. Dropping the site does the same.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.cancel();
        }
        tracing::debug!("site timers stopped");
    }
}
