//! Application configuration
//!
//! Loaded from TOML. Every section falls back to its defaults, so an empty
//! file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PORT, MAX_FRAGMENT_SIZE};
use crate::error::{Error, Result};

/// Upper bound for a configurable fragment size
pub const FRAGMENT_SIZE_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub transfer: TransferConfig,
    pub logging: LoggingConfig,
}

/// Storage node settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Directory the catalog is served from
    pub storage_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            storage_root: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Remote consumer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_address: String,
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: format!("127.0.0.1:{}", DEFAULT_PORT),
            download_dir: PathBuf::from("."),
        }
    }
}

/// Streaming transfer policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub max_fragment_size: usize,
    /// Treat a payload byte-count mismatch as a failed transfer
    pub strict_length: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_fragment_size: MAX_FRAGMENT_SIZE,
            strict_length: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Also append plain-text logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Use `path` if given, else the per-user config file if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        if let Some(default_path) = Self::default_path() {
            if default_path.exists() {
                tracing::debug!("Loading config from {}", default_path.display());
                return Self::from_file(&default_path);
            }
        }

        Ok(Self::default())
    }

    /// `config.toml` in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "wavlink")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Server port cannot be 0".to_string()));
        }
        let fragment = self.transfer.max_fragment_size;
        if fragment == 0 || fragment > FRAGMENT_SIZE_LIMIT {
            return Err(Error::Config(format!(
                "max_fragment_size must be between 1 and {}, got {}",
                FRAGMENT_SIZE_LIMIT, fragment
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.transfer.max_fragment_size, 5120);
        assert!(!config.transfer.strict_length);
        assert_eq!(config.server.listen_address(), "0.0.0.0:50051");
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 6000
            storage_root = "/srv/audio"

            [transfer]
            strict_length = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 6000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.storage_root, PathBuf::from("/srv/audio"));
        assert!(config.transfer.strict_length);
        assert_eq!(config.transfer.max_fragment_size, 5120);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::from_toml("[server]\nport = 0").is_err());
        assert!(AppConfig::from_toml("[transfer]\nmax_fragment_size = 0").is_err());
        assert!(AppConfig::from_toml("[transfer]\nmax_fragment_size = 70000").is_err());
        assert!(AppConfig::from_toml("server = 3").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.client.server_address = "10.0.0.2:7000".to_string();
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
