//! The submit-to-resolution state machine.
//!
//! ```text
//! Idle -> Validating -> RateChecking -> Serializing -> Sending
//!      Sending -> Succeeded
//!      Sending -> Retrying -> Sending      (retry_count < max_retries)
//!      Sending -> Retrying -> Failed       (retry_count == max_retries)
//! ```
//!
//! Terminal states and every early exit return to `Idle`. Only one run may be
//! in flight per pipeline; a second `submit` while one is running is rejected
//! without touching the running one.
//!
//! While `Validating`, a submission is screened in this order: lockdown,
//! honeypot, field rules, content patterns, spam indicators, behavior score.
//! Screen-outs count as violations against the attached [`ThreatLevel`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use super::error::{AttemptFailure, SubmissionError};
use super::relay::{Payload, Relay};
use crate::config::{FormConfig, RetryConfig, SiteConfig};
use crate::diagnostics::{ErrorLog, ErrorRouter, Redirect};
use crate::form::FormSnapshot;
use crate::notify::{StatusKind, StatusNotifier};
use crate::presenter::{FieldErrorPresenter, SharedForm};
use crate::rate_limit::RateLimiter;
use crate::schedule::PageClock;
use crate::screening::{self, BehaviorMonitor, ThreatLevel, ThreatStatus};
use crate::validation::Validator;

/// Shown when a run completes.
pub const SUCCESS_MESSAGE: &str = "Thank you! Your message has been sent.";

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Waiting for a submit.
    Idle,
    /// Checking field values.
    Validating,
    /// Consulting the rate limiter.
    RateChecking,
    /// Building the relay payload.
    Serializing,
    /// Waiting on the relay.
    Sending,
    /// A send failed; deciding whether to try again.
    Retrying,
    /// The relay accepted the message.
    Succeeded,
    /// Every allowed send failed.
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::RateChecking => "rate_checking",
            Self::Serializing => "serializing",
            Self::Sending => "sending",
            Self::Retrying => "retrying",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// The relay's 2xx status.
    pub status: u16,
    /// Sends made, including the first.
    pub attempts: u32,
}

/// What happened during one `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Delivery or the error that ended the run.
    pub outcome: Result<Delivery, SubmissionError>,
    /// Sends beyond the first.
    pub retries: u32,
    /// States visited, in order, starting and ending at `Idle`.
    pub transitions: Vec<PipelineState>,
    /// Error page to show after a terminal failure, if one was routed.
    pub redirect: Option<Redirect>,
}

impl SubmissionReport {
    /// Returns `true` if the message was delivered.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Clears the in-flight flag when the run ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Disables the submit control until dropped.
struct SubmitControl<'a>(&'a SubmissionPipeline);

impl<'a> SubmitControl<'a> {
    fn disable(pipeline: &'a SubmissionPipeline) -> Self {
        pipeline.set_submit_enabled(false);
        Self(pipeline)
    }
}

impl Drop for SubmitControl<'_> {
    fn drop(&mut self) {
        self.0.set_submit_enabled(true);
    }
}

/// Tracks one run's visited states.
///
/// A run dropped before it finishes puts the pipeline back to `Idle`.
struct Run<'a> {
    state: &'a Mutex<PipelineState>,
    transitions: Vec<PipelineState>,
    moved: bool,
}

impl<'a> Run<'a> {
    fn new(state: &'a Mutex<PipelineState>) -> Self {
        Self {
            state,
            transitions: vec![PipelineState::Idle],
            moved: false,
        }
    }

    fn enter(&mut self, next: PipelineState) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tracing::trace!(from = %*state, to = %next, "pipeline transition");
        *state = next;
        self.transitions.push(next);
        self.moved = true;
    }

    fn finish(
        mut self,
        outcome: Result<Delivery, SubmissionError>,
        retries: u32,
        redirect: Option<Redirect>,
    ) -> SubmissionReport {
        self.enter(PipelineState::Idle);
        SubmissionReport {
            outcome,
            retries,
            transitions: std::mem::take(&mut self.transitions),
            redirect,
        }
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        if !self.moved {
            return;
        }
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state != PipelineState::Idle {
            tracing::debug!(from = %*state, "run abandoned");
            *state = PipelineState::Idle;
        }
    }
}

/// Runs contact form submissions end to end.
pub struct SubmissionPipeline {
    form: SharedForm,
    presenter: FieldErrorPresenter,
    notifier: Arc<StatusNotifier>,
    validator: Validator,
    limiter: Arc<RateLimiter>,
    relay: Arc<dyn Relay>,
    form_config: FormConfig,
    retry: RetryConfig,
    identifier: String,
    error_log: Option<Arc<ErrorLog>>,
    threat: Option<Arc<ThreatLevel>>,
    behavior: Option<(Arc<Mutex<BehaviorMonitor>>, PageClock)>,
    router: Option<Arc<ErrorRouter>>,
    submitting: AtomicBool,
    retry_count: AtomicU32,
    state: Mutex<PipelineState>,
}

impl SubmissionPipeline {
    /// Creates a pipeline for `form`.
    ///
    /// `identifier` keys the rate limiter, normally the client fingerprint.
    #[must_use]
    pub fn new(
        config: &SiteConfig,
        form: SharedForm,
        notifier: Arc<StatusNotifier>,
        limiter: Arc<RateLimiter>,
        relay: Arc<dyn Relay>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            presenter: FieldErrorPresenter::new(Arc::clone(&form)),
            form,
            notifier,
            validator: Validator::new(config.validation.clone()),
            limiter,
            relay,
            form_config: config.form.clone(),
            retry: config.retry.clone(),
            identifier: identifier.into(),
            error_log: None,
            threat: None,
            behavior: None,
            router: None,
            submitting: AtomicBool::new(false),
            retry_count: AtomicU32::new(0),
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// Records terminal failures in `log`.
    #[must_use]
    pub fn with_error_log(mut self, log: Arc<ErrorLog>) -> Self {
        self.error_log = Some(log);
        self
    }

    /// Counts screen-outs against `threat` and honors its lockdown.
    #[must_use]
    pub fn with_threat_level(mut self, threat: Arc<ThreatLevel>) -> Self {
        self.threat = Some(threat);
        self
    }

    /// Screens out submissions whose behavior score looks automated.
    ///
    /// `clock` must be the one the monitor's samples were stamped with.
    #[must_use]
    pub fn with_behavior(mut self, monitor: Arc<Mutex<BehaviorMonitor>>, clock: PageClock) -> Self {
        self.behavior = Some((monitor, clock));
        self
    }

    /// Routes terminal relay failures to an error page.
    #[must_use]
    pub fn with_error_router(mut self, router: Arc<ErrorRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Whether a run is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Failed sends in the current run.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::Acquire)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// The presenter annotating this pipeline's form.
    #[must_use]
    pub const fn presenter(&self) -> &FieldErrorPresenter {
        &self.presenter
    }

    /// Records a client violation against the threat level.
    ///
    /// The violation that triggers lockdown disables the submit control and
    /// shows the lockdown notice. Returns `None` without a threat level.
    pub fn report_violation(&self, reason: &str) -> Option<ThreatStatus> {
        let status = self.threat.as_ref()?.record_violation(reason);
        if status == ThreatStatus::Lockdown {
            self.set_submit_enabled(false);
            self.notifier
                .show(SubmissionError::Locked.user_message(), StatusKind::Error);
        }
        Some(status)
    }

    /// Runs one submission to resolution.
    pub async fn submit(&self) -> SubmissionReport {
        let Some(_guard) = InFlightGuard::acquire(&self.submitting) else {
            tracing::debug!("submit ignored, run already in flight");
            let err = SubmissionError::InFlight;
            self.notifier.show(err.user_message(), StatusKind::Warning);
            return SubmissionReport {
                outcome: Err(err),
                retries: 0,
                transitions: vec![PipelineState::Idle],
                redirect: None,
            };
        };
        let mut run = Run::new(&self.state);

        if self.threat.as_ref().is_some_and(|t| t.is_locked()) {
            return run.finish(Err(self.reject(SubmissionError::Locked)), 0, None);
        }

        run.enter(PipelineState::Validating);
        let snapshot = FormSnapshot::capture(
            &*self
                .form
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        );

        if screening::honeypot_triggered(&snapshot) {
            return run.finish(Err(self.screen_out("honeypot field filled")), 0, None);
        }

        let verdict = self.validator.validate_form(&snapshot);
        if !verdict.valid {
            tracing::debug!(invalid_fields = verdict.field_errors.len(), "validation failed");
            self.presenter.present(&verdict);
            self.presenter.focus_first_invalid();
            let err = SubmissionError::Validation {
                invalid_fields: verdict.field_errors.len(),
            };
            return run.finish(Err(self.reject(err)), 0, None);
        }
        self.presenter.clear_all();

        let content = screening::screen(&snapshot);
        if !content.suspicious_fields.is_empty() {
            tracing::debug!(fields = ?content.suspicious_fields, "suspicious content");
            return run.finish(Err(self.screen_out("suspicious content")), 0, None);
        }
        if content.is_spam() {
            tracing::debug!(indicators = content.spam_indicators, "spam content");
            return run.finish(Err(self.screen_out("spam content")), 0, None);
        }
        if let Some(score) = self.automated_score() {
            tracing::debug!(score, "behavior score below human threshold");
            return run.finish(Err(self.screen_out("automated behavior")), 0, None);
        }

        run.enter(PipelineState::RateChecking);
        let decision = self.limiter.check_attempt(&self.identifier);
        if !decision.allowed() {
            return run.finish(
                Err(self.reject(SubmissionError::Throttled { decision })),
                0,
                None,
            );
        }

        run.enter(PipelineState::Serializing);
        let payload = Payload::from_snapshot(&snapshot, &self.form_config);

        let (outcome, retries) = {
            let _control = SubmitControl::disable(self);
            self.deliver(&mut run, &payload).await
        };

        let redirect = match &outcome {
            Err(SubmissionError::Terminal { last, .. }) => self.route_failure(last),
            _ => None,
        };
        run.finish(outcome, retries, redirect)
    }

    async fn deliver(
        &self,
        run: &mut Run<'_>,
        payload: &Payload,
    ) -> (Result<Delivery, SubmissionError>, u32) {
        self.retry_count.store(0, Ordering::Release);
        let mut attempts = 0;

        loop {
            run.enter(PipelineState::Sending);
            attempts += 1;

            let failure = match self.relay.post(payload).await {
                Ok(response) if response.is_success() => {
                    run.enter(PipelineState::Succeeded);
                    tracing::info!(status = response.status, attempts, "message delivered");
                    self.retry_count.store(0, Ordering::Release);
                    self.on_success();
                    let delivery = Delivery {
                        status: response.status,
                        attempts,
                    };
                    return (Ok(delivery), attempts - 1);
                },
                Ok(response) => AttemptFailure::Status(response.status),
                Err(err) => AttemptFailure::Network(err),
            };

            run.enter(PipelineState::Retrying);
            let retry = self.retry_count.fetch_add(1, Ordering::AcqRel) + 1;
            tracing::warn!(attempt = attempts, retry, error = %failure, "relay send failed");

            if retry >= self.retry.max_retries {
                run.enter(PipelineState::Failed);
                self.retry_count.store(0, Ordering::Release);
                let err = SubmissionError::Terminal {
                    attempts,
                    last: failure,
                };
                self.log_failure(&err);
                self.notifier.show(err.user_message(), StatusKind::Error);
                return (Err(err), attempts - 1);
            }

            self.notifier.show(
                format!(
                    "Retrying submission... ({retry}/{})",
                    self.retry.max_retries
                ),
                StatusKind::Warning,
            );
            tokio::time::sleep(self.retry.backoff.delay_for_attempt(retry)).await;
        }
    }

    fn reject(&self, err: SubmissionError) -> SubmissionError {
        tracing::info!(category = err.category(), error = %err, "submission rejected");
        self.notifier.show(err.user_message(), StatusKind::Error);
        err
    }

    fn on_success(&self) {
        {
            let mut form = self
                .form
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            form.reset();
        }
        self.presenter.clear_all();
        self.notifier.show(SUCCESS_MESSAGE, StatusKind::Success);
    }

    /// Rejects a screened submission. The run that triggers lockdown leaves
    /// the lockdown notice in place of the generic one.
    fn screen_out(&self, reason: &str) -> SubmissionError {
        let err = SubmissionError::Screened;
        tracing::info!(category = err.category(), reason, "submission screened out");
        if self.report_violation(reason) != Some(ThreatStatus::Lockdown) {
            self.notifier.show(err.user_message(), StatusKind::Error);
        }
        err
    }

    fn automated_score(&self) -> Option<u32> {
        let (monitor, clock) = self.behavior.as_ref()?;
        let monitor = monitor
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let score = monitor.submission_score(clock.now_ms());
        (score < screening::HUMAN_SCORE_THRESHOLD).then_some(score)
    }

    fn route_failure(&self, last: &AttemptFailure) -> Option<Redirect> {
        let router = self.router.as_ref()?;
        // A relay error means a request left the page, so the browser is
        // treated as online.
        let routed = match last {
            AttemptFailure::Status(status) => {
                router.route_status(*status, &self.form_config.endpoint)
            },
            AttemptFailure::Network(err) => router.route_network_error(true, &err.to_string()),
        };
        routed.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to record error context");
            None
        })
    }

    fn set_submit_enabled(&self, enabled: bool) {
        let locked = self.threat.as_ref().is_some_and(|t| t.is_locked());
        self.form
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .set_submit_enabled(enabled && !locked);
    }

    fn log_failure(&self, err: &SubmissionError) {
        let Some(log) = &self.error_log else {
            return;
        };
        if let Err(e) = log.record("SUBMISSION_FAILED", err.to_string()) {
            tracing::warn!(error = %e, "failed to record client error");
        }
    }
}

impl fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("identifier", &self.identifier)
            .field("state", &self.state())
            .field("submitting", &self.is_submitting())
            .field("retry_count", &self.retry_count())
            .finish_non_exhaustive()
    }
}
