use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use txledger_core::store::DEFAULT_BUSY_TIMEOUT;
use txledger_core::{LedgerConfig, ValueShape};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub ledger: LedgerSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: Option<String>,
    pub namespace: String,
    pub collection: String,
    pub busy_timeout_ms: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        let defaults = LedgerConfig::default();
        Self {
            path: None,
            namespace: defaults.namespace,
            collection: defaults.collection,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    pub customers: Vec<String>,
    pub shape: ValueShape,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            customers: Vec::new(),
            shape: LedgerConfig::default().default_shape,
        }
    }
}

impl Settings {
    /// Engine configuration derived from the `[store]` and `[ledger]` sections.
    pub fn ledger_config(&self) -> LedgerConfig {
        let mut config = LedgerConfig::new(&self.store.namespace, &self.store.collection);
        config.default_shape = self.ledger.shape;
        config
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.store.busy_timeout_ms)
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_db_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("ledger.db"))
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("TXLEDGER_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Read settings from `path`; a missing file yields the defaults.
pub fn read_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("txledger"));
        }
    }
    Ok(home_dir()?.join(".config").join("txledger"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("txledger"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("txledger"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
