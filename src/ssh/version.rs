//! SSH banner retrieval

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tracing::debug;

use super::error::ScanError;
use super::probe::dial;

/// Upper bound of bytes read from the server
const MAX_BANNER_SIZE: usize = 255;

/// First byte value that is not a control character
const END_OF_BANNER: u8 = 32;

/// Returned when no control byte shows up in the read window
pub const UNKNOWN_VERSION: &str = "unknown";

/// Connect to `addr` and return the identification string it sends first.
pub async fn retrieve_version(addr: &str, timeout: Duration) -> Result<String, ScanError> {
    tokio::time::timeout(timeout, fetch_banner(addr))
        .await
        .map_err(|_| ScanError::Timeout(timeout))?
}

async fn fetch_banner(addr: &str) -> Result<String, ScanError> {
    let mut stream = dial(addr).await?;

    let mut buf = [0u8; MAX_BANNER_SIZE];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Err(ScanError::IoError(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before banner",
        )));
    }
    let version = parse_banner(&buf[..n]);

    debug!("Banner of {}: {}", addr, version);
    Ok(version)
}

/// Cut the banner at the first control byte.
pub fn parse_banner(bytes: &[u8]) -> String {
    match bytes.iter().position(|&b| b < END_OF_BANNER) {
        Some(end) => String::from_utf8_lossy(&bytes[..end]).into_owned(),
        None => UNKNOWN_VERSION.to_string(),
    }
}
