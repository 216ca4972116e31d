//! folio-core - contact form pipeline and site chrome for a static portfolio.
//!
//! The crate models the behavior behind a single-page portfolio: the contact
//! form's submit pipeline (validation, screening, throttling, delivery with
//! retry, status notices) and the small stateful widgets around it.
//!
//! # Layout
//!
//! - [`submission`]: the submit state machine and the relay it posts to
//! - [`validation`], [`screening`], [`rate_limit`]: the checks a submission
//!   passes before it is sent
//! - [`form`], [`presenter`], [`notify`]: the form surface, inline field
//!   errors and the status region
//! - [`chrome`]: menu, scroll widgets, theme, counters, cookie banner
//! - [`diagnostics`]: error page routing and the client error log
//! - [`storage`], [`config`], [`schedule`]: storage, configuration and timers
//! - [`site`]: builds all of the above once per page
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//!
//! use folio_core::config::SiteConfig;
//! use folio_core::fingerprint::ClientTraits;
//! use folio_core::form::InMemoryForm;
//! use folio_core::notify::MemoryStatusRegion;
//! use folio_core::schedule::Scheduler;
//! use folio_core::site::{Site, SiteEnvironment};
//! use folio_core::storage::MemoryStore;
//! use folio_core::submission::HttpRelay;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SiteConfig::default();
//! let mut form = InMemoryForm::contact();
//! form.fill("name", "Ada Lovelace")
//!     .fill("email", "ada@example.com")
//!     .fill("subject", "general")
//!     .fill("message", "Hello from the analytical engine.");
//!
//! let site = Site::new(config.clone(), SiteEnvironment {
//!     local: Arc::new(MemoryStore::new()),
//!     session: Arc::new(MemoryStore::new()),
//!     form: Arc::new(Mutex::new(form)),
//!     region: Arc::new(Mutex::new(MemoryStatusRegion::new())),
//!     relay: Arc::new(HttpRelay::new(&config.form)?),
//!     client: ClientTraits::default(),
//!     page_url: "https://example.com/".into(),
//!     prefers_dark: false,
//!     scheduler: Scheduler::current()?,
//! })?;
//!
//! let report = site.submit().await;
//! println!("delivered: {}", report.succeeded());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod chrome;
pub mod config;
pub mod diagnostics;
pub mod fingerprint;
pub mod form;
pub mod notify;
pub mod presenter;
pub mod rate_limit;
pub mod schedule;
pub mod screening;
pub mod session;
pub mod site;
pub mod storage;
pub mod submission;
pub mod validation;

pub use config::SiteConfig;
pub use site::{Site, SiteEnvironment, SiteError};
pub use submission::{SubmissionError, SubmissionPipeline, SubmissionReport};
