//! CLI subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use folio_core::SiteConfig;
use folio_core::storage::{JsonFileStore, SharedStore};

pub mod config;
pub mod cookies;
pub mod errors;
pub mod fingerprint;
pub mod submit;
pub mod theme;
pub mod validate;

/// Shared state for every subcommand.
#[derive(Debug)]
pub struct CliContext {
    pub config: SiteConfig,
    pub state_dir: PathBuf,
}

impl CliContext {
    pub const fn new(config: SiteConfig, state_dir: PathBuf) -> Self {
        Self { config, state_dir }
    }

    /// Persistent storage (`local.json`).
    pub fn local_store(&self) -> Result<SharedStore> {
        open_store(&self.state_dir.join("local.json"))
    }

    /// Per-visit storage (`session.json`).
    pub fn session_store(&self) -> Result<SharedStore> {
        open_store(&self.state_dir.join("session.json"))
    }
}

fn open_store(path: &Path) -> Result<SharedStore> {
    let store = JsonFileStore::open(path)
        .with_context(|| format!("failed to open state file {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
