//! keyprobe command line interface.
//!
//! Prints the host keys (or their fingerprints) a server presents.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{debug, error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use keyprobe::config::{parse_duration, ConfigError, ConfigStorage, ScanConfig};
use keyprobe::{
    known_hosts_line, render_authorized_key, render_fingerprint, FingerprintDigest,
    FingerprintEncoding, HostKeyScanner, KeySet, Target,
};

/// keyprobe - print the SSH host keys a server offers
#[derive(Parser)]
#[command(name = "keyprobe", version, about = "Retrieve SSH host keys without authenticating")]
struct Cli {
    /// Host to scan: host, host:port, [v6addr]:port or a bare IPv6 address
    host: String,

    /// Key format: authorized_keys, fingerprint (sha1), fingerprint-legacy (md5), sha256, known_hosts
    #[arg(short, long, default_value = "authorized_keys")]
    format: String,

    /// Fingerprint encoding (defaults to hex for md5/sha1, base64 for sha256)
    #[arg(short, long, value_enum)]
    encoding: Option<EncodingArg>,

    /// Output format: console or json
    #[arg(short, long, default_value = "console")]
    output: String,

    /// Per-connection timeout, e.g. 60s, 1m30s, 500ms
    #[arg(short, long)]
    timeout: Option<String>,

    /// Number of simultaneous connections
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Comma separated host key algorithms to request
    #[arg(short, long, value_delimiter = ',')]
    algorithms: Option<Vec<String>>,

    /// Also print the server identification banner
    #[arg(long)]
    banner: bool,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    Hex,
    Base32,
    Base64,
}

impl From<EncodingArg> for FingerprintEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Hex => FingerprintEncoding::Hex,
            EncodingArg::Base32 => FingerprintEncoding::Base32,
            EncodingArg::Base64 => FingerprintEncoding::Base64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFormat {
    AuthorizedKeys,
    Fingerprint(FingerprintDigest),
    KnownHosts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Console,
    Json,
}

/// Unknown values fall back to authorized_keys.
fn parse_format(format: &str) -> KeyFormat {
    match format.trim().to_lowercase().as_str() {
        "fingerprint" | "sha1" | "fingerprint-sha1" => KeyFormat::Fingerprint(FingerprintDigest::Sha1),
        "fingerprint-legacy" | "md5" | "fingerprint-md5" => {
            KeyFormat::Fingerprint(FingerprintDigest::Md5)
        }
        "sha256" | "fingerprint-sha256" => KeyFormat::Fingerprint(FingerprintDigest::Sha256),
        "known_hosts" | "knownhosts" => KeyFormat::KnownHosts,
        _ => KeyFormat::AuthorizedKeys,
    }
}

fn parse_output(output: &str) -> OutputMode {
    match output.trim().to_lowercase().as_str() {
        "json" => OutputMode::Json,
        _ => OutputMode::Console,
    }
}

fn default_encoding(digest: FingerprintDigest) -> FingerprintEncoding {
    match digest {
        FingerprintDigest::Md5 | FingerprintDigest::Sha1 => FingerprintEncoding::Hex,
        FingerprintDigest::Sha256 => FingerprintEncoding::Base64,
    }
}

#[derive(Serialize)]
struct KeysReport {
    #[serde(rename = "Host")]
    host: String,
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(rename = "PublicKeys")]
    public_keys: Vec<String>,
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    #[serde(rename = "Host")]
    host: &'a str,
    #[serde(rename = "Error")]
    error: String,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn load_config(path: Option<PathBuf>) -> Result<ScanConfig> {
    let storage = match path {
        Some(path) => ConfigStorage::with_path(path),
        None => match ConfigStorage::new() {
            Ok(storage) => storage,
            Err(ConfigError::NoConfigDir) => {
                warn!("No home directory, using built-in defaults");
                return Ok(ScanConfig::default());
            }
            Err(e) => return Err(e.into()),
        },
    };
    debug!("Loading config from {:?}", storage.path());
    Ok(storage.load().await?)
}

/// Render each key once, in the order the algorithms were requested.
fn render_keys(
    keys: &KeySet,
    algorithms: &[String],
    target: &Target,
    format: KeyFormat,
    encoding: Option<FingerprintEncoding>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for algorithm in algorithms {
        let Some(key) = keys.get(algorithm) else {
            continue;
        };
        let line = match format {
            KeyFormat::AuthorizedKeys => render_authorized_key(key),
            KeyFormat::KnownHosts => known_hosts_line(target, key),
            KeyFormat::Fingerprint(digest) => {
                render_fingerprint(digest, encoding.unwrap_or_else(|| default_encoding(digest)), key)
            }
        };
        if seen.insert(line.clone()) {
            lines.push(line);
        }
    }
    lines
}

async fn run(cli: &Cli) -> Result<KeysReport> {
    let config = load_config(cli.config.clone()).await?;
    let mut options = config.scan_options()?;

    if let Some(timeout) = &cli.timeout {
        options.timeout = parse_duration(timeout)?;
    }
    if let Some(concurrency) = cli.concurrency {
        options.concurrency = concurrency;
    }
    if let Some(algorithms) = &cli.algorithms {
        let algorithms: Vec<String> = algorithms
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if !algorithms.is_empty() {
            options.algorithms = algorithms;
        }
    }

    let target = Target::parse(&cli.host)?;
    let addr = target.dial_addr();
    debug!(
        "Scanning {} with {} algorithms, concurrency {}, timeout {:?}",
        addr,
        options.algorithms.len(),
        options.concurrency,
        options.timeout
    );

    let algorithms = options.algorithms.clone();
    let scanner = HostKeyScanner::new(options);

    let version = if cli.banner {
        Some(scanner.version(&addr).await?)
    } else {
        None
    };
    let keys = scanner.host_keys(&addr).await?;

    let format = parse_format(&cli.format);
    let encoding = cli.encoding.map(FingerprintEncoding::from);
    Ok(KeysReport {
        host: cli.host.clone(),
        version,
        public_keys: render_keys(&keys, &algorithms, &target, format, encoding),
    })
}

fn print_report(report: &KeysReport, output: OutputMode) -> Result<()> {
    match output {
        OutputMode::Json => println!("{}", serde_json::to_string(report)?),
        OutputMode::Console => {
            if let Some(version) = &report.version {
                println!("# {} {}", report.host, version);
            }
            for line in &report.public_keys {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();
    cli.host = cli.host.trim().to_string();
    init_tracing(cli.verbose);

    let output = parse_output(&cli.output);
    let result = match run(&cli).await {
        Ok(report) => print_report(&report, output),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("{}", e);
        match output {
            OutputMode::Json => {
                let report = ErrorReport {
                    host: &cli.host,
                    error: e.to_string(),
                };
                match serde_json::to_string(&report) {
                    Ok(json) => println!("{}", json),
                    Err(_) => eprintln!("keyprobe: {e}"),
                }
            }
            OutputMode::Console => eprintln!("keyprobe: {e}"),
        }
        std::process::exit(1);
    }
}
