//! folio - contact form and site state from the command line.
//!
//! Runs the portfolio's contact pipeline against the configured relay and
//! inspects the persisted browser-side state (theme, cookie consent, error
//! log) kept under the state directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_core::SiteConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod terminal;

/// folio - portfolio contact pipeline
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the site configuration file
    #[arg(short, long, default_value = "folio.toml")]
    config: PathBuf,

    /// Directory for local/session storage (overrides `storage.dir`)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit the contact form through the configured relay
    Submit(commands::submit::SubmitArgs),

    /// Validate a single field value
    Validate(commands::validate::ValidateArgs),

    /// Show or change the colour theme
    #[command(subcommand)]
    Theme(commands::theme::ThemeCommand),

    /// Show or change cookie consent
    #[command(subcommand)]
    Cookies(commands::cookies::CookiesCommand),

    /// Inspect the client error log
    #[command(subcommand)]
    Errors(commands::errors::ErrorsCommand),

    /// Print this client's rate-limit fingerprint
    Fingerprint(commands::fingerprint::FingerprintArgs),

    /// Configuration commands
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = SiteConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    let state_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(|| config.storage.dir.clone());
    tracing::debug!(
        config = %cli.config.display(),
        state_dir = %state_dir.display(),
        "loaded configuration"
    );
    let ctx = commands::CliContext::new(config, state_dir);

    match cli.command {
        Commands::Submit(args) => {
            // Submission outcomes map to distinct exit codes so scripts can
            // tell validation and throttling apart from relay failures.
            let exit_code = commands::submit::run(&ctx, &args)?;
            std::process::exit(i32::from(exit_code));
        },
        Commands::Validate(args) => {
            let exit_code = commands::validate::run(&ctx, &args);
            std::process::exit(i32::from(exit_code));
        },
        Commands::Theme(cmd) => commands::theme::run(&ctx, &cmd),
        Commands::Cookies(cmd) => commands::cookies::run(&ctx, &cmd),
        Commands::Errors(cmd) => commands::errors::run(&ctx, &cmd),
        Commands::Fingerprint(args) => commands::fingerprint::run(&args),
        Commands::Config(cmd) => commands::config::run(&ctx, &cmd),
    }
}
