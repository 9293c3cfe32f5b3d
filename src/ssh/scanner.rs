//! Host key scanner
//!
//! Fans a bounded number of workers out over the requested algorithms. Each
//! worker pulls algorithms from a shared queue and runs one probe at a time,
//! so at most `concurrency` connections to the target are open at once.
//!
//! The first real error cancels the pool: queued algorithms are abandoned,
//! in-flight probes are dropped (closing their sockets) and the call returns
//! that error without any partial result.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use russh::keys::PublicKey;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::algorithms::default_algorithms;
use super::error::ScanError;
use super::probe::{probe_host_key, ProbeOutcome};
use super::version::retrieve_version;

/// Default number of concurrent probes
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default per-probe timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Host keys keyed by the algorithm they were requested with
pub type KeySet = HashMap<String, PublicKey>;

/// Scan parameters
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Algorithms to probe; empty means the default catalogue
    pub algorithms: Vec<String>,
    /// Maximum simultaneous probes (0 is treated as 1)
    pub concurrency: usize,
    /// Deadline for each individual probe
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            algorithms: default_algorithms(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ScanOptions {
    pub fn with_algorithms(mut self, algorithms: Vec<String>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn effective_algorithms(&self) -> Vec<String> {
        if self.algorithms.is_empty() {
            default_algorithms()
        } else {
            self.algorithms.clone()
        }
    }

    fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Result reported by a worker for one dequeued algorithm
struct ProbeReport {
    algorithm: String,
    outcome: Result<ProbeOutcome, ScanError>,
}

/// Retrieves host keys and banners from SSH servers
#[derive(Debug, Clone, Default)]
pub struct HostKeyScanner {
    options: ScanOptions,
}

impl HostKeyScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Retrieve the host keys `addr` presents for the configured algorithms.
    pub async fn host_keys(&self, addr: &str) -> Result<KeySet, ScanError> {
        self.host_keys_until(addr, CancellationToken::new()).await
    }

    /// Like [`host_keys`](Self::host_keys), aborting with
    /// [`ScanError::Cancelled`] once `cancel` fires.
    pub async fn host_keys_until(
        &self,
        addr: &str,
        cancel: CancellationToken,
    ) -> Result<KeySet, ScanError> {
        let algorithms = self.options.effective_algorithms();
        let workers = self.options.effective_concurrency().min(algorithms.len());
        let timeout = self.options.timeout;

        info!(
            "Scanning {} for {} host key algorithms with {} workers",
            addr,
            algorithms.len(),
            workers
        );

        let queue = Arc::new(Mutex::new(algorithms.iter().cloned().collect::<VecDeque<_>>()));
        // One slot per algorithm so no worker ever blocks on send
        let (tx, mut rx) = mpsc::channel(algorithms.len().max(1));
        let pool_cancel = cancel.child_token();

        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            tasks.spawn(worker(
                worker_id,
                addr.to_string(),
                timeout,
                queue.clone(),
                tx.clone(),
                pool_cancel.clone(),
            ));
        }
        drop(tx);

        let mut keys = KeySet::new();
        let mut failure: Option<ScanError> = None;

        // Closes only after every worker has dropped its sender
        while let Some(report) = rx.recv().await {
            match report.outcome {
                Ok(ProbeOutcome::Captured(key)) => {
                    keys.insert(report.algorithm, key);
                }
                Ok(ProbeOutcome::Unsupported) => {}
                Err(e) => {
                    pool_cancel.cancel();
                    // A probe cut short by the pool must not mask the error that stopped it
                    let replace = match &failure {
                        None => true,
                        Some(first) => first.is_cancelled() && !e.is_cancelled(),
                    };
                    if replace {
                        warn!("Probe {} against {} failed: {}", report.algorithm, addr, e);
                        failure = Some(e);
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Scan worker for {} ended abnormally: {}", addr, e);
                failure.get_or_insert(ScanError::Worker(e.to_string()));
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        info!("Scan of {} found {} host keys", addr, keys.len());
        Ok(keys)
    }

    /// Read the identification banner `addr` sends before key exchange.
    pub async fn version(&self, addr: &str) -> Result<String, ScanError> {
        self.version_until(addr, CancellationToken::new()).await
    }

    pub async fn version_until(
        &self,
        addr: &str,
        cancel: CancellationToken,
    ) -> Result<String, ScanError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            result = retrieve_version(addr, self.options.timeout) => result,
        }
    }
}

/// Pull algorithms from the queue and probe them one at a time.
async fn worker(
    worker_id: usize,
    addr: String,
    timeout: Duration,
    queue: Arc<Mutex<VecDeque<String>>>,
    results: mpsc::Sender<ProbeReport>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let Some(algorithm) = queue.lock().pop_front() else {
            break;
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            outcome = probe_host_key(&addr, &algorithm, timeout) => outcome,
        };

        // Stop the other workers before they dial again
        if outcome.is_err() {
            cancel.cancel();
        }

        if results.send(ProbeReport { algorithm, outcome }).await.is_err() {
            break;
        }
    }
    debug!("Scan worker {} for {} finished", worker_id, addr);
}

/// Retrieve host keys with one-off options.
pub async fn retrieve_host_keys(addr: &str, options: &ScanOptions) -> Result<KeySet, ScanError> {
    HostKeyScanner::new(options.clone()).host_keys(addr).await
}
