//! SSH Error types

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by host key and banner retrieval.
///
/// An algorithm the server does not support is not an error; it is simply
/// missing from the returned key set.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to resolve address {addr}: {reason}")]
    Resolve { addr: String, reason: String },

    #[error("Connection to {addr} failed: {source}")]
    ConnectionFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH protocol error: {0}")]
    ProtocolError(String),

    #[error("Session was established without exchanging host keys")]
    CaptureBypassed,

    #[error("Host key capture signal belongs to another probe")]
    TokenMismatch,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl ScanError {
    /// True when the call ran out of time rather than being rejected.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScanError::Timeout(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled)
    }
}

impl From<russh::Error> for ScanError {
    fn from(err: russh::Error) -> Self {
        ScanError::ProtocolError(err.to_string())
    }
}

// Rendered as a plain string in JSON output
impl serde::Serialize for ScanError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
