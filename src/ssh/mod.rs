//! SSH module - host key and banner retrieval
//!
//! Uses the russh client to run partial handshakes against a server, one per
//! host key algorithm, and captures the key the server presents before any
//! authentication happens.
//!
//! # Features
//! - Single-algorithm probes with a key-capture handler
//! - Bounded worker pool with fail-fast cancellation
//! - Identification banner reader
//! - known_hosts line rendering

pub mod algorithms;
mod capture;
mod error;
pub mod known_hosts;
mod probe;
mod scanner;
mod version;

pub use algorithms::{default_algorithms, offerable, DEFAULT_ALGORITHMS};
pub use capture::{CaptureHandler, HandshakeError};
pub use error::ScanError;
pub use known_hosts::{host_pattern, known_hosts_line};
pub use probe::{probe_host_key, ProbeOutcome};
pub use scanner::{
    retrieve_host_keys, HostKeyScanner, KeySet, ScanOptions, DEFAULT_CONCURRENCY,
    DEFAULT_TIMEOUT,
};
pub use version::{parse_banner, retrieve_version, UNKNOWN_VERSION};
