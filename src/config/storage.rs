//! Configuration Storage
//!
//! Reads the scan config file from disk.
//! Config location: ~/.keyprobe/config.json on macOS/Linux, %APPDATA%\keyprobe on Windows

use std::path::{Path, PathBuf};

use tokio::fs;

use super::types::{ScanConfig, CONFIG_VERSION};
use super::ConfigError;

/// Get the keyprobe configuration directory
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("keyprobe"));
        }
        dirs::home_dir()
            .map(|home| home.join(".keyprobe"))
            .ok_or(ConfigError::NoConfigDir)
    }

    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|home| home.join(".keyprobe"))
            .ok_or(ConfigError::NoConfigDir)
    }
}

/// Get the config file path
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json"))
}

/// Configuration storage manager
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Create a storage manager with the default path
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            path: config_file()?,
        })
    }

    /// Create storage manager with custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load configuration from disk
    /// Returns default config if the file doesn't exist or is corrupted
    pub async fn load(&self) -> Result<ScanConfig, ConfigError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => match serde_json::from_str::<ScanConfig>(&contents) {
                Ok(config) => {
                    if config.version > CONFIG_VERSION {
                        return Err(ConfigError::VersionTooNew {
                            found: config.version,
                            supported: CONFIG_VERSION,
                        });
                    }
                    tracing::debug!("Loaded config from {:?}", self.path);
                    Ok(config)
                }
                Err(e) => {
                    tracing::warn!("Config file {:?} corrupted, using defaults: {}", self.path, e);
                    Ok(ScanConfig::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ScanConfig::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }
}
