//! Host key capture hook
//!
//! A `russh` client handler whose only job is to grab the server's host key
//! during key exchange and then stop the handshake. The stop signal is a
//! dedicated error variant tagged with the probe's token, so a captured key
//! is never confused with a real failure (or with another probe's capture).

use russh::client;
use russh::keys::PublicKey;
use russh::AlgorithmKind;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

/// Error type driving the intercepted handshake.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The hook stored the host key; the handshake was aborted on purpose.
    #[error("got host key for probe {0}")]
    Captured(Uuid),

    /// The handshake layer invoked the hook a second time.
    #[error("host key hook invoked twice for probe {0}")]
    Reentered(Uuid),

    /// Client and server share no host key algorithm.
    #[error("no common host key algorithm")]
    Unsupported,

    /// Any other failure reported by the handshake layer.
    #[error(transparent)]
    Protocol(russh::Error),
}

impl From<russh::Error> for HandshakeError {
    fn from(err: russh::Error) -> Self {
        match err {
            russh::Error::NoCommonAlgo {
                kind: AlgorithmKind::Key,
                ..
            } => HandshakeError::Unsupported,
            other => HandshakeError::Protocol(other),
        }
    }
}

/// One-shot hook registered with the handshake before it starts.
pub struct CaptureHandler {
    token: Uuid,
    slot: Option<oneshot::Sender<PublicKey>>,
}

impl CaptureHandler {
    /// Create a hook and the receiver the captured key will arrive on.
    pub fn new(token: Uuid) -> (Self, oneshot::Receiver<PublicKey>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                token,
                slot: Some(tx),
            },
            rx,
        )
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    /// Record the key and produce the abort signal.
    fn capture(&mut self, key: &PublicKey) -> HandshakeError {
        let Some(slot) = self.slot.take() else {
            warn!("Probe {}: host key hook invoked twice", self.token);
            return HandshakeError::Reentered(self.token);
        };

        debug!(
            "Probe {}: captured {} host key",
            self.token,
            key.algorithm().as_str()
        );
        // The receiver lives as long as the probe; a send failure means the
        // probe is already gone and nobody wants the key.
        let _ = slot.send(key.clone());
        HandshakeError::Captured(self.token)
    }
}

impl client::Handler for CaptureHandler {
    type Error = HandshakeError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        Err(self.capture(server_public_key))
    }
}
