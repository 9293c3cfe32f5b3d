//! In-process servers shared by the integration tests.

#![allow(dead_code)]

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use russh::keys::{decode_secret_key, Algorithm, EcdsaCurve, HashAlg, PrivateKey};
use russh::{server, Preferred};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

/// Load a host private key from `tests/fixtures`.
pub fn host_key(name: &str) -> PrivateKey {
    decode_secret_key(&fixture(name), None).unwrap()
}

/// `<algorithm> <base64>` of a fixture's `.pub` file.
pub fn authorized_key(name: &str) -> String {
    let contents = fixture(&format!("{name}.pub"));
    contents
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn rsa_algorithms() -> Vec<Algorithm> {
    vec![
        Algorithm::Rsa {
            hash: Some(HashAlg::Sha512),
        },
        Algorithm::Rsa {
            hash: Some(HashAlg::Sha256),
        },
        Algorithm::Rsa { hash: None },
    ]
}

pub fn ecdsa_p256_algorithms() -> Vec<Algorithm> {
    vec![Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP256,
    }]
}

pub fn ed25519_algorithms() -> Vec<Algorithm> {
    vec![Algorithm::Ed25519]
}

struct TestHandler;

impl server::Handler for TestHandler {
    type Error = russh::Error;
}

/// SSH server offering `keys` for the given host key algorithms.
pub async fn spawn_ssh_server(keys: Vec<PrivateKey>, algorithms: Vec<Algorithm>) -> SocketAddr {
    let config = Arc::new(server::Config {
        keys,
        preferred: Preferred {
            key: Cow::Owned(algorithms),
            ..Preferred::default()
        },
        inactivity_timeout: Some(Duration::from_secs(10)),
        ..Default::default()
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let config = config.clone();
            tokio::spawn(async move {
                if let Ok(session) = server::run_stream(config, stream, TestHandler).await {
                    let _ = session.await;
                }
            });
        }
    });
    addr
}

/// Extra connections a server-side count may show: a client can close one
/// socket and dial the next before the server task has read the EOF.
pub const CLOSE_LAG_ALLOWANCE: usize = 1;

/// Let connection tasks whose peer already hung up record the close before
/// a new connection is counted.
async fn settle() {
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
}

/// Connection counters for a listener.
#[derive(Default)]
pub struct ConnectionStats {
    active: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl ConnectionStats {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    fn open(self: &Arc<Self>) -> ConnectionGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard(self.clone())
    }

    /// Wait until no connection is open, up to `limit`.
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while self.active() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        true
    }
}

struct ConnectionGuard(Arc<ConnectionStats>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Accepts connections and never answers; each connection stays counted
/// until the client closes it.
pub async fn spawn_tarpit() -> (SocketAddr, Arc<ConnectionStats>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stats = Arc::new(ConnectionStats::default());
    let counters = stats.clone();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            settle().await;
            let guard = counters.open();
            tokio::spawn(async move {
                let _guard = guard;
                let mut buf = [0u8; 1024];
                while let Ok(n) = stream.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            });
        }
    });
    (addr, stats)
}

/// Forwards to `upstream` after `delay`, counting open connections.
pub async fn spawn_counting_proxy(
    upstream: SocketAddr,
    delay: Duration,
) -> (SocketAddr, Arc<ConnectionStats>) {
    spawn_proxy(upstream, delay, None).await
}

/// Like [`spawn_counting_proxy`] without delay, but the `fail_on`-th
/// connection (1-based) is closed right after accept.
pub async fn spawn_faulty_proxy(
    upstream: SocketAddr,
    fail_on: usize,
) -> (SocketAddr, Arc<ConnectionStats>) {
    spawn_proxy(upstream, Duration::ZERO, Some(fail_on)).await
}

async fn spawn_proxy(
    upstream: SocketAddr,
    delay: Duration,
    fail_on: Option<usize>,
) -> (SocketAddr, Arc<ConnectionStats>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stats = Arc::new(ConnectionStats::default());
    let counters = stats.clone();
    tokio::spawn(async move {
        while let Ok((inbound, _)) = listener.accept().await {
            settle().await;
            let guard = counters.open();
            if fail_on == Some(counters.total()) {
                drop(inbound);
                drop(guard);
                continue;
            }
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let Ok(outbound) = TcpStream::connect(upstream).await else {
                    return;
                };
                let (mut in_read, mut in_write) = inbound.into_split();
                let (mut out_read, mut out_write) = outbound.into_split();
                let downstream = tokio::spawn(async move {
                    let _ = tokio::io::copy(&mut out_read, &mut in_write).await;
                });
                // The client hanging up ends the connection; the upstream
                // side may linger until its own timeout.
                let _ = tokio::io::copy(&mut in_read, &mut out_write).await;
                drop(guard);
                downstream.abort();
            });
        }
    });
    (addr, stats)
}

/// Writes `banner` to every client, then waits for it to hang up.
pub async fn spawn_banner_server(banner: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                if stream.write_all(banner).await.is_ok() {
                    let mut buf = [0u8; 256];
                    let _ = stream.read(&mut buf).await;
                }
            });
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
