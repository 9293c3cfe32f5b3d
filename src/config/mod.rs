//! Configuration Management Module
//!
//! Scan defaults (algorithms, concurrency, timeout) with an optional JSON
//! config file. Command line flags override file values.

pub mod duration;
pub mod storage;
pub mod types;

pub use duration::parse_duration;
pub use storage::{config_dir, config_file, ConfigStorage};
pub use types::{ScanConfig, CONFIG_VERSION};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },

    #[error("'{0}' is not a duration")]
    InvalidDuration(String),
}
