//! `folio cookies`: cookie consent.

use anyhow::Result;
use clap::Subcommand;
use folio_core::chrome::CookieConsent;

use super::CliContext;

/// Cookie consent subcommands.
#[derive(Debug, Subcommand)]
pub enum CookiesCommand {
    /// Show whether consent was given
    Status,
    /// Record consent
    Accept,
    /// Dismiss the banner without recording consent
    Decline,
}

pub fn run(ctx: &CliContext, cmd: &CookiesCommand) -> Result<()> {
    let mut consent = CookieConsent::load(ctx.local_store()?)?;
    match cmd {
        CookiesCommand::Status => {
            if consent.is_accepted() {
                println!("accepted");
            } else {
                println!("not accepted");
            }
        },
        CookiesCommand::Accept => {
            consent.accept()?;
            println!("accepted");
        },
        CookiesCommand::Decline => {
            consent.decline();
            println!("declined (not recorded; the banner returns on the next visit)");
        },
    }
    Ok(())
}
