//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Locate the todo store file and the log directory.
//! - Pick the log level and capture hotkey.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - Resolution never fails; missing per-user dirs fall back to the temp dir.

use crate::hotkey::DEFAULT_CAPTURE_HOTKEY;
use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_STORE_PATH: &str = "TODO_CAPTURE_STORE_PATH";
pub const ENV_LOG_DIR: &str = "TODO_CAPTURE_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "TODO_CAPTURE_LOG_LEVEL";
pub const ENV_HOTKEY: &str = "TODO_CAPTURE_HOTKEY";

const APP_DIR_NAME: &str = "todo-capture";
const STORE_FILE_NAME: &str = "todos.json";
const LOG_DIR_NAME: &str = "logs";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub hotkey: String,
}

impl AppConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, falling back to per-user defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let data_dir = app_data_dir();
        Self {
            store_path: value(ENV_STORE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(STORE_FILE_NAME)),
            log_dir: value(ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(LOG_DIR_NAME)),
            log_level: value(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            hotkey: value(ENV_HOTKEY).unwrap_or_else(|| DEFAULT_CAPTURE_HOTKEY.to_string()),
        }
    }
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}
