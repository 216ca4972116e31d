//! Site construction and background timers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use folio_core::chrome::Theme;
use folio_core::config::SiteConfig;
use folio_core::diagnostics::{
    IMAGE_PLACEHOLDER, IMAGE_PLACEHOLDER_ALT, ResourceKind, ResourceRecovery,
};
use folio_core::fingerprint::ClientTraits;
use folio_core::form::InMemoryForm;
use folio_core::notify::MemoryStatusRegion;
use folio_core::schedule::Scheduler;
use folio_core::storage::{KeyValueStore, MemoryStore, keys};
use folio_core::submission::{Payload, Relay, RelayError, RelayResponse, SubmissionError};
use folio_core::{Site, SiteEnvironment, SiteError};

struct AcceptingRelay;

#[async_trait]
impl Relay for AcceptingRelay {
    async fn post(&self, _payload: &Payload) -> Result<RelayResponse, RelayError> {
        Ok(RelayResponse::new(200))
    }
}

struct Stores {
    local: Arc<MemoryStore>,
    session: Arc<MemoryStore>,
}

impl Stores {
    fn new() -> Self {
        Self {
            local: Arc::new(MemoryStore::new()),
            session: Arc::new(MemoryStore::new()),
        }
    }

    fn env(&self, prefers_dark: bool) -> SiteEnvironment {
        SiteEnvironment {
            local: self.local.clone(),
            session: self.session.clone(),
            form: Arc::new(Mutex::new(InMemoryForm::contact())),
            region: Arc::new(Mutex::new(MemoryStatusRegion::new())),
            relay: Arc::new(AcceptingRelay),
            client: ClientTraits::default(),
            page_url: "https://portfolio.example/".to_string(),
            prefers_dark,
            scheduler: Scheduler::current().unwrap(),
        }
    }
}

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

fn banner_visible(site: &Site) -> bool {
    site.cookies().lock().unwrap().is_visible()
}

#[tokio::test(start_paused = true)]
async fn construction_resets_page_state() {
    let stores = Stores::new();
    stores.session.set(keys::ERROR_REDIRECTED, "true").unwrap();

    let site = Site::new(SiteConfig::default(), stores.env(true)).unwrap();

    assert_eq!(stores.session.get(keys::ERROR_REDIRECTED).unwrap(), None);
    assert!(site.session_id().starts_with("sess_"));
    assert_eq!(
        stores.session.get(keys::SESSION_ID).unwrap().as_deref(),
        Some(site.session_id())
    );
    assert_eq!(site.fingerprint(), ClientTraits::default().fingerprint());
    assert_eq!(site.theme().current(), Theme::Dark);
}

#[tokio::test(start_paused = true)]
async fn session_id_survives_reload() {
    let stores = Stores::new();
    let first = Site::new(SiteConfig::default(), stores.env(false)).unwrap();
    let id = first.session_id().to_string();
    drop(first);

    let second = Site::new(SiteConfig::default(), stores.env(false)).unwrap();
    assert_eq!(second.session_id(), id);
}

#[tokio::test(start_paused = true)]
async fn cookie_banner_appears_after_delay() {
    let stores = Stores::new();
    let site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();
    settle().await;
    assert!(!banner_visible(&site));

    tokio::time::advance(Duration::from_millis(1_999)).await;
    settle().await;
    assert!(!banner_visible(&site));

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert!(banner_visible(&site));

    site.cookies().lock().unwrap().accept().unwrap();
    assert_eq!(
        stores.local.get(keys::COOKIES_ACCEPTED).unwrap().as_deref(),
        Some("true")
    );
}

#[tokio::test(start_paused = true)]
async fn accepted_cookies_skip_the_banner() {
    let stores = Stores::new();
    stores.local.set(keys::COOKIES_ACCEPTED, "true").unwrap();
    let site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert!(!banner_visible(&site));
}

#[tokio::test(start_paused = true)]
async fn limiter_is_swept_periodically() {
    let stores = Stores::new();
    let site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();
    settle().await;

    assert!(site.limiter().check_attempt("someone").allowed());
    assert_eq!(site.limiter().tracked_identifiers(), 1);

    tokio::time::advance(Duration::from_secs(16 * 60)).await;
    settle().await;
    assert_eq!(site.limiter().tracked_identifiers(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_timers() {
    let stores = Stores::new();
    let mut site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();
    site.shutdown();

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert!(!banner_visible(&site));
}

#[tokio::test(start_paused = true)]
async fn saved_theme_beats_system_preference() {
    let stores = Stores::new();
    stores.local.set(keys::THEME, "light").unwrap();
    let mut site = Site::new(SiteConfig::default(), stores.env(true)).unwrap();
    assert_eq!(site.theme().current(), Theme::Light);

    assert_eq!(site.theme_mut().toggle().unwrap(), Theme::Dark);
    assert_eq!(stores.local.get(keys::THEME).unwrap().as_deref(), Some("dark"));
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected() {
    let stores = Stores::new();
    let mut config = SiteConfig::default();
    config.rate_limit.max_attempts = 0;

    let err = Site::new(config, stores.env(false)).unwrap_err();
    assert!(matches!(err, SiteError::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn site_submits_through_its_pipeline() {
    let stores = Stores::new();
    let env = stores.env(false);
    let form = Arc::new(Mutex::new(InMemoryForm::contact()));
    form.lock()
        .unwrap()
        .fill("name", "Alan Turing")
        .fill("email", "alan@example.com")
        .fill("subject", "job-offer")
        .fill("message", "We would like to offer you a position.");
    let env = SiteEnvironment {
        form: form.clone(),
        ..env
    };

    let site = Site::new(SiteConfig::default(), env).unwrap();
    let report = site.submit().await;
    assert!(report.succeeded());
    assert_eq!(site.limiter().attempts_in_window(site.fingerprint()), 1);
}

#[tokio::test(start_paused = true)]
async fn rapid_typing_counts_as_a_violation() {
    let stores = Stores::new();
    let site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();

    // Eleven near-instant gaps in a row.
    for _ in 0..12 {
        site.on_keystroke();
    }
    assert_eq!(site.threat().level(), 2);
}

#[tokio::test(start_paused = true)]
async fn scripted_interaction_is_reported_by_the_scan() {
    let stores = Stores::new();
    let site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();
    settle().await;

    for i in 0..20u32 {
        site.on_pointer_move(f64::from(i) * 5.0, f64::from(i) * 5.0);
        site.on_scroll(f64::from(i) * 100.0);
        site.on_keystroke();
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    assert_eq!(site.threat().level(), 0);

    tokio::time::advance(Duration::from_secs(8)).await;
    settle().await;
    assert_eq!(site.threat().level(), 2);
}

#[tokio::test(start_paused = true)]
async fn hurried_scripted_fill_is_screened() {
    let stores = Stores::new();
    let env = stores.env(false);
    let form = Arc::new(Mutex::new(InMemoryForm::contact()));
    form.lock()
        .unwrap()
        .fill("name", "Alan Turing")
        .fill("email", "alan@example.com")
        .fill("subject", "job-offer")
        .fill("message", "We would like to offer you a position.");
    let env = SiteEnvironment {
        form: form.clone(),
        ..env
    };
    let site = Site::new(SiteConfig::default(), env).unwrap();

    site.on_form_focus();
    for _ in 0..25 {
        site.on_keystroke();
        tokio::time::advance(Duration::from_millis(120)).await;
    }

    let report = site.submit().await;
    assert_eq!(report.outcome, Err(SubmissionError::Screened));
    assert_eq!(site.threat().level(), 2);
    assert_eq!(site.limiter().attempts_in_window(site.fingerprint()), 0);
}

#[tokio::test(start_paused = true)]
async fn runtime_errors_are_logged_and_routed_once() {
    let stores = Stores::new();
    let site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();

    assert_eq!(site.on_runtime_error("ResizeObserver loop limit exceeded"), None);
    assert!(site.error_log().entries().unwrap().is_empty());

    let redirect = site.on_runtime_error("TypeError: menu is undefined").unwrap();
    assert_eq!(redirect.path, "/errors/500.html");
    assert_eq!(site.router().last_error().unwrap().unwrap().kind, "500");

    // Logged again, but the redirect is one-shot per page load.
    assert_eq!(site.on_runtime_error("TypeError: menu is undefined"), None);
    let entries = site.error_log().entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.kind == "RUNTIME_ERROR"));
}

#[tokio::test(start_paused = true)]
async fn failed_resources_are_logged_and_images_replaced() {
    let stores = Stores::new();
    let site = Site::new(SiteConfig::default(), stores.env(false)).unwrap();

    assert_eq!(
        site.on_resource_error(ResourceKind::Image, "/img/avatar.webp"),
        ResourceRecovery::Placeholder {
            src: IMAGE_PLACEHOLDER,
            alt: IMAGE_PLACEHOLDER_ALT,
        }
    );
    assert_eq!(
        site.on_resource_error(ResourceKind::Script, "/js/particles.js"),
        ResourceRecovery::LogOnly
    );

    let entries = site.error_log().entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, "RESOURCE_ERROR");
    assert!(entries[1].detail.contains("/js/particles.js"));
    // Resource failures never leave the page.
    assert!(!site.router().already_redirected().unwrap());
}
