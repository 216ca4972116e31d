//! `folio config`: configuration inspection.

use anyhow::Result;
use clap::Subcommand;

use super::CliContext;

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Check the configuration and report problems
    Check,
}

pub fn run(ctx: &CliContext, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => print!("{}", ctx.config.to_toml()?),
        ConfigCommand::Check => {
            ctx.config.validate()?;
            if ctx.config.form.endpoint.is_empty() {
                println!("ok (form.endpoint is empty; submit will refuse to run)");
            } else {
                println!("ok");
            }
        },
    }
    Ok(())
}
