//! `folio submit`: runs the contact pipeline once.
//!
//! # Exit Codes
//!
//! - 0: Delivered
//! - 1: Relay failure or configuration error
//! - 2: The form was rejected (invalid fields or screened)
//! - 3: Throttled or locked

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Args;
use folio_core::fingerprint::ClientTraits;
use folio_core::form::{FormSurface, InMemoryForm};
use folio_core::schedule::Scheduler;
use folio_core::submission::{HttpRelay, SubmissionError, SubmissionReport};
use folio_core::{Site, SiteEnvironment};
use serde::Serialize;

use super::{CliContext, print_json};
use crate::terminal::TerminalStatus;

/// Exit codes for `folio submit`.
pub mod exit_codes {
    /// Message delivered.
    pub const SUCCESS: u8 = 0;
    /// Relay failed or was unreachable.
    pub const ERROR: u8 = 1;
    /// Invalid or screened form.
    pub const REJECTED: u8 = 2;
    /// Rate limited or locked.
    pub const THROTTLED: u8 = 3;
}

/// Arguments for `folio submit`.
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Sender name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Reply-to address
    #[arg(long, default_value = "")]
    pub email: String,

    /// Topic (general, project, consulting, security-audit, job-offer, other)
    #[arg(long, default_value = "")]
    pub subject: String,

    /// Message body
    #[arg(long, default_value = "")]
    pub message: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ReportView {
    delivered: bool,
    status: Option<u16>,
    retries: u32,
    transitions: Vec<String>,
    error: Option<String>,
    error_page: Option<&'static str>,
    field_errors: Vec<FieldErrorView>,
}

#[derive(Debug, Serialize)]
struct FieldErrorView {
    field: String,
    message: String,
}

/// Runs the submission and returns the exit code.
pub fn run(ctx: &CliContext, args: &SubmitArgs) -> Result<u8> {
    let relay = HttpRelay::new(&ctx.config.form).context("relay is not usable, set form.endpoint")?;

    let mut form = InMemoryForm::contact();
    form.fill("name", &args.name)
        .fill("email", &args.email)
        .fill("subject", &args.subject)
        .fill("message", &args.message);
    let form = Arc::new(Mutex::new(form));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let report = rt.block_on(async {
        let site = Site::new(ctx.config.clone(), SiteEnvironment {
            local: ctx.local_store()?,
            session: ctx.session_store()?,
            form: form.clone(),
            region: Arc::new(Mutex::new(TerminalStatus::new())),
            relay: Arc::new(relay),
            client: ClientTraits::default(),
            page_url: "cli://folio/contact".to_string(),
            prefers_dark: false,
            scheduler: Scheduler::current().context("no tokio runtime")?,
        })
        .context("failed to initialize site")?;
        anyhow::Ok(site.submit().await)
    })?;

    let field_errors = {
        let form = form.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        form.annotated_fields()
            .into_iter()
            .filter_map(|field| {
                form.error(field).map(|message| FieldErrorView {
                    field: field.to_string(),
                    message,
                })
            })
            .collect::<Vec<_>>()
    };

    let view = ReportView {
        delivered: report.succeeded(),
        status: report.outcome.as_ref().ok().map(|d| d.status),
        retries: report.retries,
        transitions: report.transitions.iter().map(ToString::to_string).collect(),
        error: report.outcome.as_ref().err().map(ToString::to_string),
        error_page: report.redirect.as_ref().map(|r| r.path),
        field_errors,
    };

    if args.json {
        print_json(&view)?;
    } else {
        print_text(&view);
    }

    Ok(exit_code(&report))
}

fn print_text(view: &ReportView) {
    if view.delivered {
        println!("Delivered after {} retr{}", view.retries, if view.retries == 1 { "y" } else { "ies" });
        return;
    }
    if let Some(error) = &view.error {
        println!("Not delivered: {error}");
    }
    if let Some(page) = view.error_page {
        println!("Error page: {page}");
    }
    for e in &view.field_errors {
        println!("  {}: {}", e.field, e.message);
    }
}

fn exit_code(report: &SubmissionReport) -> u8 {
    match &report.outcome {
        Ok(_) => exit_codes::SUCCESS,
        Err(SubmissionError::Validation { .. } | SubmissionError::Screened) => {
            exit_codes::REJECTED
        },
        Err(SubmissionError::Throttled { .. } | SubmissionError::Locked) => exit_codes::THROTTLED,
        Err(_) => exit_codes::ERROR,
    }
}

#[cfg(test)]
mod tests {
    use folio_core::rate_limit::RateDecision;
    use folio_core::submission::{AttemptFailure, Delivery, PipelineState};

    use super::*;

    fn report(outcome: Result<Delivery, SubmissionError>) -> SubmissionReport {
        SubmissionReport {
            outcome,
            retries: 0,
            transitions: vec![PipelineState::Idle],
            redirect: None,
        }
    }

    #[test]
    fn test_exit_codes() {
        let ok = report(Ok(Delivery {
            status: 200,
            attempts: 1,
        }));
        assert_eq!(exit_code(&ok), exit_codes::SUCCESS);
        assert_eq!(
            exit_code(&report(Err(SubmissionError::Validation { invalid_fields: 1 }))),
            exit_codes::REJECTED
        );
        assert_eq!(
            exit_code(&report(Err(SubmissionError::Throttled {
                decision: RateDecision::Blocked,
            }))),
            exit_codes::THROTTLED
        );
        assert_eq!(
            exit_code(&report(Err(SubmissionError::Terminal {
                attempts: 3,
                last: AttemptFailure::Status(500),
            }))),
            exit_codes::ERROR
        );
    }
}
