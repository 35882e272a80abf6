//! Application context for the txledger CLI.
//!
//! Bundles the parsed arguments with lazily-loaded settings so handlers do
//! not have to thread both around.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use tracing::debug;

use txledger_core::{LedgerStore, SqliteStore};

use crate::cli::Cli;
use crate::config::{default_db_path, read_settings, resolve_config_path, Settings};

pub struct AppContext<'a> {
    cli: &'a Cli,
    settings: OnceCell<Settings>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            settings: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Settings from the config file, loaded on first use.
    pub fn settings(&self) -> anyhow::Result<&Settings> {
        self.settings.get_or_try_init(|| {
            let path = resolve_config_path()?;
            debug!(path = %path.display(), "loading settings");
            read_settings(&path)
        })
    }

    /// Customers to operate on: `--customer` flags, else the config file.
    pub fn customers(&self) -> anyhow::Result<Vec<String>> {
        if !self.cli.customers.is_empty() {
            return Ok(self.cli.customers.clone());
        }
        let configured = &self.settings()?.ledger.customers;
        if configured.is_empty() {
            return Err(anyhow::anyhow!(
                "No customers given.\nHint: pass --customer NAME or set `customers` under [ledger] in the config file."
            ));
        }
        Ok(configured.clone())
    }

    /// Database path: `--db`/`TXLEDGER_DB`, else the config file, else the XDG data dir.
    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.cli.db.clone() {
            return Ok(path);
        }
        if let Some(path) = self.settings()?.store.path.as_ref() {
            return Ok(PathBuf::from(path));
        }
        let path = default_db_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create data directory {}: {}", parent.display(), e)
            })?;
        }
        Ok(path)
    }

    /// Open the ledger store over the configured SQLite database.
    pub fn open_ledger(&self) -> anyhow::Result<LedgerStore<SqliteStore>> {
        let settings = self.settings()?;
        let path = self.db_path()?;
        debug!(path = %path.display(), "opening ledger database");
        let store = SqliteStore::open(&path, settings.busy_timeout())?;
        Ok(LedgerStore::new(store, settings.ledger_config()))
    }
}
