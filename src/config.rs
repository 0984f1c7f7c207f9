use crate::app_dirs::AppDirs;
use crate::session::SESSION_SECS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::problem::TABLE_RANGE;

/// Pause between answer feedback and the next problem
pub const SETTLE_DELAY_MS: u64 = 800;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Tables ticked on the menu at launch
    pub tables: Vec<u32>,
    pub session_secs: u32,
    pub settle_delay_ms: u64,
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            session_secs: SESSION_SECS,
            settle_delay_ms: SETTLE_DELAY_MS,
            sound: true,
        }
    }
}

impl Config {
    /// Stored tables restricted to the menu range
    pub fn selected_tables(&self) -> BTreeSet<u32> {
        self.tables
            .iter()
            .copied()
            .filter(|t| TABLE_RANGE.contains(t))
            .collect()
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("tabledrill_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
