use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::db::connection::{ConnectionParams, DEFAULT_PORT};

/// Errors raised while loading configuration. Not part of the operation taxonomy.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionDefaults,
    pub safety: SafetyConfig,
    pub sqlite: SqliteConfig,
}

/// Defaults applied when building connection parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionDefaults {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        ConnectionDefaults {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            user: "root".to_string(),
        }
    }
}

/// How caller-supplied identifiers are checked before they reach SQL text.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierPolicy {
    /// Restrictive character class only
    #[default]
    Charset,
    /// Character class, plus the table must exist on the server
    Schema,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    pub identifier_policy: IdentifierPolicy,
}

/// SQLite-related configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SqliteConfig {
    /// Create the database file when it does not exist
    pub create_if_missing: bool,
    pub foreign_keys: bool,
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        SqliteConfig {
            create_if_missing: false,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// `<config dir>/sqlbridge/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqlbridge").join("config.toml"))
    }

    /// Loads the default config file, falling back to defaults when it is absent.
    pub fn load_or_default() -> Result<Config, ConfigError> {
        match Config::default_path() {
            Some(path) if path.exists() => load_config(path),
            _ => Ok(Config::default()),
        }
    }

    /// Connection parameters for `database` using the configured defaults.
    pub fn connection_params(&self, password: impl Into<String>, database: impl Into<String>) -> ConnectionParams {
        ConnectionParams::new(
            self.connection.host.clone(),
            self.connection.user.clone(),
            password,
            database,
        )
        .with_port(self.connection.port)
    }
}

/// Loads configuration from a TOML file at the given path.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
