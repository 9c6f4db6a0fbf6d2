//! Oto Config: host configuration.
//!
//! Layering order: built-in defaults, then `local.config.json` if present,
//! then the `PORT` environment variable. The config file uses camelCase
//! keys and may name any subset of fields; unnamed fields keep their
//! defaults. A malformed file or an unparseable `PORT` stops startup
//! rather than limping along with half a configuration.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "local.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("invalid PORT value {value:?}")]
    Port { value: String },

    #[error("database not found at {}; run the audio data import first", path.display())]
    DatabaseMissing { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            data_dir: "./data".into(),
            database_path: "./data/audio.db".into(),
        }
    }
}

impl Config {
    /// Load from [`CONFIG_FILE`] in the working directory, then apply the
    /// `PORT` override.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Same layering with an explicit file path. A missing file is fine
    /// and yields the defaults; a present-but-broken file is not.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = Self::read_file(path)?;
        if let Ok(port) = std::env::var("PORT") {
            cfg.port = parse_port(&port)?;
        }
        Ok(cfg)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|source| ConfigError::Parse { path: path.into(), source }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path: path.into(), source }),
        }
    }

    /// Startup guard: the database must already exist. A missing file
    /// means the one-time import has not run, which nothing here can fix.
    pub fn ensure_database(&self) -> Result<(), ConfigError> {
        if self.database_path.exists() {
            Ok(())
        } else {
            Err(ConfigError::DatabaseMissing { path: self.database_path.clone() })
        }
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::Port { value: value.to_owned() })
}
