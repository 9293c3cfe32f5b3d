//! known_hosts line rendering
//!
//! Produces lines in the format OpenSSH reads from `~/.ssh/known_hosts`.
//! Nothing is written to disk here.

use russh::keys::{PublicKey, PublicKeyBase64};

use crate::target::{Target, DEFAULT_SSH_PORT};

/// Host field of a known_hosts entry: `host` on port 22, `[host]:port` otherwise
pub fn host_pattern(host: &str, port: u16) -> String {
    let host = host.to_lowercase();
    if port == DEFAULT_SSH_PORT {
        host
    } else {
        format!("[{}]:{}", host, port)
    }
}

/// `host keytype base64key` for the given target and key
pub fn known_hosts_line(target: &Target, key: &PublicKey) -> String {
    format!(
        "{} {} {}",
        host_pattern(&target.host, target.port),
        key.algorithm().as_str(),
        key.public_key_base64()
    )
}
