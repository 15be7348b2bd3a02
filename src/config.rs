//! Runtime configuration.
//!
//! Configuration is read once at startup from the process environment
//! (after an optional `.env` file has been loaded) and handed to the rest
//! of the application as an immutable value. There is no ambient global
//! configuration state.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application name used for the default database directory
const APP_NAME: &str = "wanicache";

/// Database file name
const DB_FILE: &str = "wanikani_cache.db";

/// Environment variable holding the WaniKani API key (required)
const API_KEY_VAR: &str = "WANIKANI_API_KEY";

/// Environment variable overriding the database path (optional)
const DB_PATH_VAR: &str = "WANICACHE_DB";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub database_path: PathBuf,
}

impl Config {
    /// Load configuration from the environment. A missing API key is a
    /// fatal error, raised before any network or storage activity.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_VAR).with_context(|| {
            format!("{} is not set; a WaniKani API key is required", API_KEY_VAR)
        })?;
        if api_key.trim().is_empty() {
            anyhow::bail!("{} is set but empty", API_KEY_VAR);
        }

        let database_path = match env::var_os(DB_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => Self::default_database_path()?,
        };

        Ok(Self {
            api_key,
            database_path,
        })
    }

    fn default_database_path() -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(DB_FILE))
    }
}
