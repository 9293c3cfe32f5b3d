//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::duration::parse_duration;
use super::ConfigError;
use crate::ssh::{default_algorithms, ScanOptions, DEFAULT_CONCURRENCY};

/// Current config format version
pub const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout() -> String {
    "60s".to_string()
}

/// Scan defaults stored in `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Host key algorithms to probe (empty = built-in catalogue)
    #[serde(default)]
    pub algorithms: Vec<String>,

    /// Simultaneous probes per scan
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-probe timeout, e.g. "60s" or "1m30s"
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            algorithms: Vec::new(),
            concurrency: default_concurrency(),
            timeout: default_timeout(),
        }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.timeout)
    }

    /// Build scan options from this config.
    pub fn scan_options(&self) -> Result<ScanOptions, ConfigError> {
        let algorithms = if self.algorithms.is_empty() {
            default_algorithms()
        } else {
            self.algorithms.clone()
        };
        Ok(ScanOptions {
            algorithms,
            concurrency: self.concurrency,
            timeout: self.timeout()?,
        })
    }
}
