//! Host key algorithm catalogue.
//!
//! Identifiers are the names used on the wire during key exchange. Only a
//! subset of them can actually be offered by the handshake layer; the rest
//! are always reported as unsupported.

use russh::keys::{Algorithm, EcdsaCurve, HashAlg};

pub const KEY_ALGO_RSA: &str = "ssh-rsa";
pub const KEY_ALGO_DSA: &str = "ssh-dss";
pub const KEY_ALGO_ECDSA256: &str = "ecdsa-sha2-nistp256";
pub const KEY_ALGO_SK_ECDSA256: &str = "sk-ecdsa-sha2-nistp256@openssh.com";
pub const KEY_ALGO_ECDSA384: &str = "ecdsa-sha2-nistp384";
pub const KEY_ALGO_ECDSA521: &str = "ecdsa-sha2-nistp521";
pub const KEY_ALGO_ED25519: &str = "ssh-ed25519";
pub const KEY_ALGO_SK_ED25519: &str = "sk-ssh-ed25519@openssh.com";
pub const KEY_ALGO_RSA_SHA256: &str = "rsa-sha2-256";
pub const KEY_ALGO_RSA_SHA512: &str = "rsa-sha2-512";

pub const CERT_ALGO_RSA_V01: &str = "ssh-rsa-cert-v01@openssh.com";
pub const CERT_ALGO_DSA_V01: &str = "ssh-dss-cert-v01@openssh.com";
pub const CERT_ALGO_ECDSA256_V01: &str = "ecdsa-sha2-nistp256-cert-v01@openssh.com";
pub const CERT_ALGO_ECDSA384_V01: &str = "ecdsa-sha2-nistp384-cert-v01@openssh.com";
pub const CERT_ALGO_ECDSA521_V01: &str = "ecdsa-sha2-nistp521-cert-v01@openssh.com";
pub const CERT_ALGO_SK_ECDSA256_V01: &str = "sk-ecdsa-sha2-nistp256-cert-v01@openssh.com";
pub const CERT_ALGO_ED25519_V01: &str = "ssh-ed25519-cert-v01@openssh.com";
pub const CERT_ALGO_SK_ED25519_V01: &str = "sk-ssh-ed25519-cert-v01@openssh.com";
pub const CERT_ALGO_RSA_SHA256_V01: &str = "rsa-sha2-256-cert-v01@openssh.com";
pub const CERT_ALGO_RSA_SHA512_V01: &str = "rsa-sha2-512-cert-v01@openssh.com";

/// Default algorithms, in probing order: plain key types first, then their
/// certificate variants.
pub const DEFAULT_ALGORITHMS: &[&str] = &[
    KEY_ALGO_RSA,
    KEY_ALGO_DSA,
    KEY_ALGO_ECDSA256,
    KEY_ALGO_SK_ECDSA256,
    KEY_ALGO_ECDSA384,
    KEY_ALGO_ECDSA521,
    KEY_ALGO_ED25519,
    KEY_ALGO_SK_ED25519,
    KEY_ALGO_RSA_SHA256,
    KEY_ALGO_RSA_SHA512,
    CERT_ALGO_RSA_V01,
    CERT_ALGO_DSA_V01,
    CERT_ALGO_ECDSA256_V01,
    CERT_ALGO_ECDSA384_V01,
    CERT_ALGO_ECDSA521_V01,
    CERT_ALGO_SK_ECDSA256_V01,
    CERT_ALGO_ED25519_V01,
    CERT_ALGO_SK_ED25519_V01,
    CERT_ALGO_RSA_SHA256_V01,
    CERT_ALGO_RSA_SHA512_V01,
];

/// Owned copy of [`DEFAULT_ALGORITHMS`].
pub fn default_algorithms() -> Vec<String> {
    DEFAULT_ALGORITHMS.iter().map(|name| name.to_string()).collect()
}

/// Map an identifier to the algorithm the handshake layer can offer.
///
/// Returns `None` for DSA, security-key and certificate host keys, and for
/// names that are not host key algorithms at all.
pub fn offerable(name: &str) -> Option<Algorithm> {
    let algorithm = match name {
        KEY_ALGO_RSA => Algorithm::Rsa { hash: None },
        KEY_ALGO_RSA_SHA256 => Algorithm::Rsa {
            hash: Some(HashAlg::Sha256),
        },
        KEY_ALGO_RSA_SHA512 => Algorithm::Rsa {
            hash: Some(HashAlg::Sha512),
        },
        KEY_ALGO_ECDSA256 => Algorithm::Ecdsa {
            curve: EcdsaCurve::NistP256,
        },
        KEY_ALGO_ECDSA384 => Algorithm::Ecdsa {
            curve: EcdsaCurve::NistP384,
        },
        KEY_ALGO_ECDSA521 => Algorithm::Ecdsa {
            curve: EcdsaCurve::NistP521,
        },
        KEY_ALGO_ED25519 => Algorithm::Ed25519,
        _ => return None,
    };
    Some(algorithm)
}
