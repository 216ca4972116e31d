//! `folio theme`: the persisted colour theme.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use folio_core::chrome::{Theme, ThemeManager};

use super::CliContext;

/// Theme subcommands.
#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    /// Show the active theme
    Show {
        /// Resolve as if the system prefers a dark scheme
        #[arg(long)]
        prefers_dark: bool,
    },
    /// Switch between light and dark
    Toggle {
        /// Resolve as if the system prefers a dark scheme
        #[arg(long)]
        prefers_dark: bool,
    },
    /// Pick a theme explicitly
    Set {
        /// `light` or `dark`
        theme: String,
    },
}

pub fn run(ctx: &CliContext, cmd: &ThemeCommand) -> Result<()> {
    let local = ctx.local_store()?;
    match cmd {
        ThemeCommand::Show { prefers_dark } => {
            let manager = ThemeManager::load(local, *prefers_dark)?;
            let source = if manager.is_manually_set()? {
                "saved"
            } else {
                "system"
            };
            print_theme(manager.current(), source);
        },
        ThemeCommand::Toggle { prefers_dark } => {
            let mut manager = ThemeManager::load(local, *prefers_dark)?;
            print_theme(manager.toggle()?, "saved");
        },
        ThemeCommand::Set { theme } => {
            let theme: Theme = theme.parse().map_err(|e: String| anyhow!(e))?;
            let mut manager = ThemeManager::load(local, false)?;
            print_theme(manager.set(theme)?, "saved");
        },
    }
    Ok(())
}

fn print_theme(theme: Theme, source: &str) {
    println!(
        "{theme} ({source}) icon={} theme-color={}",
        theme.icon(),
        theme.meta_color()
    );
}
