//! Fingerprint and authorized_keys rendering
//!
//! Fingerprints are digests of the SSH wire encoding of a public key.

use std::fmt::Write;

use base64::{engine::general_purpose::STANDARD_NO_PAD as BASE64_NO_PAD, Engine};
use md5::Md5;
use russh::keys::{PublicKey, PublicKeyBase64};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Digest used for a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintDigest {
    Md5,
    Sha1,
    Sha256,
}

/// Text encoding of a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintEncoding {
    /// `aa:bb:cc:...`
    Hex,
    /// RFC 4648 base32, no padding
    Base32,
    /// Standard base64, no padding
    Base64,
}

impl FingerprintDigest {
    fn sum(self, data: &[u8]) -> Vec<u8> {
        match self {
            FingerprintDigest::Md5 => Md5::digest(data).to_vec(),
            FingerprintDigest::Sha1 => Sha1::digest(data).to_vec(),
            FingerprintDigest::Sha256 => Sha256::digest(data).to_vec(),
        }
    }
}

impl FingerprintEncoding {
    pub fn encode(self, sum: &[u8]) -> String {
        match self {
            FingerprintEncoding::Hex => sum_to_hex(sum),
            FingerprintEncoding::Base32 => base32_no_pad(sum),
            FingerprintEncoding::Base64 => BASE64_NO_PAD.encode(sum),
        }
    }
}

/// Fingerprint of `key` using the given digest and encoding.
pub fn render_fingerprint(
    digest: FingerprintDigest,
    encoding: FingerprintEncoding,
    key: &PublicKey,
) -> String {
    let sum = digest.sum(&key.public_key_bytes());
    encoding.encode(&sum)
}

/// `keytype base64key` line as used in authorized_keys files.
pub fn render_authorized_key(key: &PublicKey) -> String {
    format!("{} {}", key.algorithm().as_str(), key.public_key_base64())
}

/// Format a digest as lowercase hex pairs joined by colons.
pub fn sum_to_hex(sum: &[u8]) -> String {
    let mut out = String::with_capacity(sum.len() * 3);
    for (i, byte) in sum.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

fn base32_no_pad(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_PUB: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAM8hUoDiLCLzUEwsZhjssLFsi/lBadVjXEsYml6XGIC";

    fn test_key() -> PublicKey {
        PublicKey::from_openssh(ED25519_PUB).unwrap()
    }

    #[test]
    fn test_sum_to_hex() {
        assert_eq!(sum_to_hex(&[]), "");
        assert_eq!(sum_to_hex(&[0x0a]), "0a");
        assert_eq!(sum_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "de:ad:be:ef");
    }

    #[test]
    fn test_hex_shape() {
        for (digest, len) in [
            (FingerprintDigest::Md5, 16),
            (FingerprintDigest::Sha1, 20),
            (FingerprintDigest::Sha256, 32),
        ] {
            let fp = render_fingerprint(digest, FingerprintEncoding::Hex, &test_key());
            assert_eq!(fp.len(), len * 3 - 1);
            assert_eq!(fp.matches(':').count(), len - 1);
            assert_eq!(fp.replace(':', "").len(), len * 2);
        }
    }

    #[test]
    fn test_base32_vectors() {
        assert_eq!(base32_no_pad(b""), "");
        assert_eq!(base32_no_pad(b"f"), "MY");
        assert_eq!(base32_no_pad(b"fo"), "MZXQ");
        assert_eq!(base32_no_pad(b"foo"), "MZXW6");
        assert_eq!(base32_no_pad(b"foob"), "MZXW6YQ");
        assert_eq!(base32_no_pad(b"fooba"), "MZXW6YTB");
        assert_eq!(base32_no_pad(b"foobar"), "MZXW6YTBOI");
    }

    #[test]
    fn test_known_fingerprints() {
        let key = test_key();
        assert_eq!(
            render_fingerprint(FingerprintDigest::Md5, FingerprintEncoding::Hex, &key),
            "c7:4c:63:3e:6e:19:26:8c:10:07:7c:47:ec:9e:41:f8"
        );
        assert_eq!(
            render_fingerprint(FingerprintDigest::Sha1, FingerprintEncoding::Hex, &key),
            "7a:a3:a0:d2:19:dd:56:e3:3d:d1:32:de:fa:5a:c0:63:f5:ac:f9:16"
        );
        assert_eq!(
            render_fingerprint(FingerprintDigest::Sha256, FingerprintEncoding::Base64, &key),
            "YGVrINoqMUH/EmLPxoksopoybQgL/Y/iTrBs+YcDXLQ"
        );
        assert_eq!(
            render_fingerprint(FingerprintDigest::Md5, FingerprintEncoding::Base32, &key),
            "Y5GGGPTODETIYEAHPRD6ZHSB7A"
        );
        assert_eq!(
            render_fingerprint(FingerprintDigest::Sha1, FingerprintEncoding::Base64, &key),
            "eqOg0hndVuM90TLe+lrAY/Ws+RY"
        );
    }

    #[test]
    fn test_deterministic() {
        let key = test_key();
        let a = render_fingerprint(FingerprintDigest::Sha256, FingerprintEncoding::Base32, &key);
        let b = render_fingerprint(FingerprintDigest::Sha256, FingerprintEncoding::Base32, &key);
        assert_eq!(a, b);
        assert_eq!(a, "MBSWWIG2FIYUD7YSMLH4NCJMUKNDE3IIBP6Y7YSOWBWPTBYDLS2A");
    }

    #[test]
    fn test_authorized_key() {
        assert_eq!(render_authorized_key(&test_key()), ED25519_PUB);
    }
}
