//! `folio errors`: the client error log and last routed error.

use anyhow::Result;
use clap::Subcommand;
use folio_core::diagnostics::{ErrorLog, ErrorRouter};

use super::{CliContext, print_json};

/// Error log subcommands.
#[derive(Debug, Subcommand)]
pub enum ErrorsCommand {
    /// List recorded client errors, oldest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear the log and the last routed error
    Clear,
}

pub fn run(ctx: &CliContext, cmd: &ErrorsCommand) -> Result<()> {
    let log = ErrorLog::new(ctx.local_store()?);
    let router = ErrorRouter::new(ctx.session_store()?, "cli://folio", "folio");

    match cmd {
        ErrorsCommand::List { json } => {
            let entries = log.entries()?;
            let last = router.last_error()?;
            if *json {
                print_json(&serde_json::json!({
                    "entries": entries,
                    "last_error": last,
                }))?;
                return Ok(());
            }
            if entries.is_empty() {
                println!("no client errors recorded");
            }
            for entry in &entries {
                println!("{} {} {}", entry.timestamp.to_rfc3339(), entry.kind, entry.detail);
            }
            if let Some(last) = last {
                println!("last routed error: {} at {}", last.kind, last.url);
            }
        },
        ErrorsCommand::Clear => {
            log.clear()?;
            router.clear_last_error()?;
            println!("cleared");
        },
    }
    Ok(())
}
