//! Application configuration, read from `config.json` in the app data
//! directory. Every field has a default so a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub const CONFIG_FILE: &str = "config.json";

/// Environment variables consulted for the log filter, highest priority first.
pub const LOG_ENV_VARS: [&str; 2] = ["RESTAURANT_ADMIN_LOG", "RUST_LOG"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file name inside the app data directory.
    pub database_file: String,
    /// Seed the demo restaurant into an empty database on startup.
    pub seed_demo_data: bool,
    pub log_filter: String,
    pub log_to_file: bool,
    /// Make the mock assistant actually wait its reported latency.
    pub simulate_ai_latency: bool,
    /// ISO code used when the company record has none.
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_file: "restaurant-admin.db".to_string(),
            seed_demo_data: true,
            log_filter: if cfg!(debug_assertions) {
                "info,restaurant_admin_lib=debug,tao=error".to_string()
            } else {
                "warn,restaurant_admin_lib=info,tao=error".to_string()
            },
            log_to_file: true,
            simulate_ai_latency: true,
            currency: "USD".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the config file. A missing file yields defaults; a malformed one
    /// is an error so the caller can log it once logging is up.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Applies environment overrides, looked up through `lookup` so tests
    /// don't have to touch the process environment.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(filter) = LOG_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            self.log_filter = filter;
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }
}

/// Where the app keeps its files; the app data directory in production.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn preferences_file(&self) -> PathBuf {
        self.data_dir.join(crate::preferences::PREFERENCES_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
