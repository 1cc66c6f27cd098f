//! Application Settings
//!
//! JSON settings file. Missing fields fall back to their defaults and a
//! missing file yields the default settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file; `:memory:` keeps everything in memory
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// How long the store subscription outlives its last observer
    #[serde(default = "default_grace_ms")]
    pub visible_items_grace_ms: u64,
    #[serde(default = "default_log_max_bytes")]
    pub log_max_bytes: u64,
    #[serde(default = "default_log_keep_lines")]
    pub log_keep_lines: usize,
}

fn default_database_path() -> PathBuf { PathBuf::from("shopping_list.db") }
fn default_log_dir() -> PathBuf { PathBuf::from("logs") }
fn default_app_name() -> String { "ShoppingList".to_string() }
fn default_grace_ms() -> u64 { 5_000 }
fn default_log_max_bytes() -> u64 { 5 * 1024 * 1024 }
fn default_log_keep_lines() -> usize { 1000 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_dir: default_log_dir(),
            app_name: default_app_name(),
            visible_items_grace_ms: default_grace_ms(),
            log_max_bytes: default_log_max_bytes(),
            log_keep_lines: default_log_keep_lines(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn visible_items_grace(&self) -> Duration {
        Duration::from_millis(self.visible_items_grace_ms)
    }

    pub fn logger_options(&self) -> rolling_logger::LoggerOptions {
        rolling_logger::LoggerOptions {
            max_bytes: self.log_max_bytes,
            keep_lines: self.log_keep_lines,
            ..rolling_logger::LoggerOptions::default()
        }
    }
}
