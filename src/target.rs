//! Scan target parsing
//!
//! Accepts `host`, `host:port`, `[ipv6]:port` and bare IPv6 literals.
//! Port 22 is assumed when none is given.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TargetError {
    #[error("empty host")]
    Empty,

    #[error("'{0}' is not a valid hostname")]
    InvalidHost(String),

    #[error("'{0}' is not a valid port")]
    InvalidPort(String),
}

/// A validated host and port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Address suitable for dialling (`host:port`, IPv6 in brackets)
    pub fn dial_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Parse a user supplied target.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TargetError::Empty);
        }

        // [v6]:port or [v6]
        if let Some(rest) = input.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| TargetError::InvalidHost(input.to_string()))?;
            if host.parse::<std::net::Ipv6Addr>().is_err() {
                return Err(TargetError::InvalidHost(input.to_string()));
            }
            let port = match tail {
                "" => DEFAULT_SSH_PORT,
                _ => parse_port(
                    tail.strip_prefix(':')
                        .ok_or_else(|| TargetError::InvalidHost(input.to_string()))?,
                )?,
            };
            return Ok(Self::new(host, port));
        }

        // Bare IP literal (covers IPv6 without brackets)
        if input.parse::<IpAddr>().is_ok() {
            return Ok(Self::new(input, DEFAULT_SSH_PORT));
        }

        let (host, port) = match input.rsplit_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (input, DEFAULT_SSH_PORT),
        };

        if host.parse::<IpAddr>().is_ok() || is_hostname(host) {
            Ok(Self::new(host, port))
        } else {
            Err(TargetError::InvalidHost(host.to_string()))
        }
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dial_addr())
    }
}

fn parse_port(port: &str) -> Result<u16, TargetError> {
    match port.parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(TargetError::InvalidPort(port.to_string())),
    }
}

/// RFC 1123 hostname: dot separated labels of alphanumerics and inner hyphens
fn is_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}
