//! keyprobe - retrieve the SSH host keys and banner a server presents
//!
//! A scan opens one connection per host key algorithm, restricts the
//! handshake to that algorithm, and keeps whatever key the server offers.
//! No authentication is ever attempted.

pub mod config;
pub mod fingerprint;
pub mod ssh;
pub mod target;

pub use fingerprint::{
    render_authorized_key, render_fingerprint, sum_to_hex, FingerprintDigest, FingerprintEncoding,
};
pub use ssh::{
    default_algorithms, known_hosts_line, retrieve_host_keys, retrieve_version, HostKeyScanner,
    KeySet, ScanError, ScanOptions,
};
pub use target::{Target, TargetError};
