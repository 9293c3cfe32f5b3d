//! Single-algorithm host key probe
//!
//! Opens one TCP connection, starts an SSH handshake that only accepts the
//! requested host key algorithm, and lets [`CaptureHandler`] abort it as soon
//! as the server's key arrives.
//!
//! # Flow
//! 1. Dial the target (one connection per probe)
//! 2. Relay the socket into an in-memory pipe handed to `russh`
//! 3. `check_server_key` stores the key and returns `HandshakeError::Captured`
//! 4. Classify: captured / unsupported / fault
//!
//! The socket is owned by the probe future, never by the handshake task, so
//! dropping the probe (timeout or cancellation) closes the connection at once.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use russh::client;
use russh::keys::{Algorithm, PublicKey};
use russh::Preferred;
use tokio::io::DuplexStream;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use uuid::Uuid;

use super::algorithms;
use super::capture::{CaptureHandler, HandshakeError};
use super::error::ScanError;

/// Buffer size of the in-memory pipe between socket and handshake
const RELAY_BUFFER_SIZE: usize = 32 * 1024;

/// Verdict of a single probe
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The server presented this key for the requested algorithm
    Captured(PublicKey),
    /// The server (or the handshake layer) cannot use the algorithm
    Unsupported,
}

impl ProbeOutcome {
    pub fn key(&self) -> Option<&PublicKey> {
        match self {
            ProbeOutcome::Captured(key) => Some(key),
            ProbeOutcome::Unsupported => None,
        }
    }
}

/// Probe `addr` for its host key of type `algorithm`, bounded by `timeout`.
pub async fn probe_host_key(
    addr: &str,
    algorithm: &str,
    timeout: Duration,
) -> Result<ProbeOutcome, ScanError> {
    let Some(offered) = algorithms::offerable(algorithm) else {
        debug!("{} cannot be offered, reporting unsupported", algorithm);
        return Ok(ProbeOutcome::Unsupported);
    };

    tokio::time::timeout(timeout, run_probe(addr, offered))
        .await
        .map_err(|_| ScanError::Timeout(timeout))?
}

async fn run_probe(addr: &str, offered: Algorithm) -> Result<ProbeOutcome, ScanError> {
    let algorithm = offered.as_str().to_string();
    let stream = dial(addr).await?;

    let token = Uuid::new_v4();
    debug!("Probe {}: {} against {}", token, algorithm, addr);

    let (handler, mut captured) = CaptureHandler::new(token);

    // Only the host key list is restricted; kex/cipher/mac stay at defaults
    let ssh_config = client::Config {
        preferred: Preferred {
            key: Cow::Owned(vec![offered]),
            ..Preferred::default()
        },
        ..Default::default()
    };

    let (transport, pipe) = tokio::io::duplex(RELAY_BUFFER_SIZE);
    let handshake = client::connect_stream(Arc::new(ssh_config), transport, handler);
    tokio::pin!(handshake);

    let result = tokio::select! {
        result = &mut handshake => result,
        // Socket closed first: the pipe is gone too, so the handshake ends on EOF
        _ = relay(stream, pipe) => handshake.await,
    };

    match result {
        Ok(handle) => {
            warn!(
                "Probe {}: session to {} established without host key capture",
                token, addr
            );
            drop(handle);
            Err(ScanError::CaptureBypassed)
        }
        Err(HandshakeError::Captured(signal)) if signal == token => match captured.try_recv() {
            Ok(key) => {
                debug!("Probe {}: {} host key captured", token, algorithm);
                Ok(ProbeOutcome::Captured(key))
            }
            Err(_) => Err(ScanError::ProtocolError(format!(
                "capture signalled for probe {} but no key was stored",
                token
            ))),
        },
        Err(HandshakeError::Captured(signal)) => {
            warn!("Probe {}: received capture signal of probe {}", token, signal);
            Err(ScanError::TokenMismatch)
        }
        Err(HandshakeError::Unsupported) => {
            debug!("Probe {}: {} not supported by {}", token, algorithm, addr);
            Ok(ProbeOutcome::Unsupported)
        }
        Err(e @ HandshakeError::Reentered(_)) => Err(ScanError::ProtocolError(e.to_string())),
        Err(HandshakeError::Protocol(e)) => Err(ScanError::from(e)),
    }
}

/// Copy bytes between the socket and the handshake pipe until either side
/// closes. Both ends are dropped on return.
async fn relay(mut socket: TcpStream, mut pipe: DuplexStream) {
    match tokio::io::copy_bidirectional(&mut socket, &mut pipe).await {
        Ok((sent, received)) => debug!("Relay closed ({} bytes out, {} bytes in)", sent, received),
        Err(e) => debug!("Relay closed: {}", e),
    }
}

/// Resolve `addr` and open a TCP connection to the first address.
pub(crate) async fn dial(addr: &str) -> Result<TcpStream, ScanError> {
    let socket_addr = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| ScanError::Resolve {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| ScanError::Resolve {
            addr: addr.to_string(),
            reason: "no address found".to_string(),
        })?;

    TcpStream::connect(socket_addr)
        .await
        .map_err(|source| ScanError::ConnectionFailed {
            addr: addr.to_string(),
            source,
        })
}
