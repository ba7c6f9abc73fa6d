//! certaudit: Command-line tool for validating the TLS certificate served by a host.

use anyhow::{Context, Result};
use certaudit_lib::{
    ServedChain, TrustStore, ValidateOptions, Validation, ValidationReport, ValidationTestResult,
    Validator,
};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "certaudit",
    about = "Validate the TLS certificate chain served by a host",
    long_about = "certaudit connects to a TLS endpoint, captures the certificate chain it\n\
                  serves, and runs a fixed sequence of checks: hostname match, validity\n\
                  window, certificate lifetime, chain shape, signature algorithms, CA\n\
                  trust, root certificate and key usage.\n\n\
                  Each check is reported as PASSED, WARNING or FAILED.",
    after_help = "EXAMPLES:\n\
                  \n  certaudit validate www.example.com\
                  \n  certaudit validate www.example.com --port 8443 --timeout 5s\
                  \n  certaudit validate --multiple domains.json --output report.json\
                  \n  certaudit validate www.example.com --chain-file chain.pem --CAfile root.pem\
                  \n  certaudit validate www.example.com --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the certificate served for a hostname
    #[command(after_help = "DOMAINS FILE:\n\
                      \n  A JSON array of hostnames, or an object with a \"domains\" array:\
                      \n    [\"example.com\", \"www.example.com\"]\
                      \n    {\"domains\": [\"example.com\"]}\
                      \n\nEXIT STATUS:\n\
                      \n  0  validation completed (FAILED checks included, unless --fail-on-error)\
                      \n  1  fatal error (bad arguments, unreadable or malformed files)\
                      \n  2  at least one FAILED check with --fail-on-error")]
    Validate {
        /// Hostname to validate. Omit when --multiple is given.
        hostname: Option<String>,
        /// TCP port to connect to
        #[arg(long, default_value_t = certaudit_lib::DEFAULT_PORT)]
        port: u16,
        /// Write a JSON report to FILE
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Print certificate details and debug logging
        #[arg(short, long)]
        verbose: bool,
        /// JSON file listing hostnames to validate one after another
        #[arg(long, value_name = "FILE")]
        multiple: Option<PathBuf>,
        /// Connect and handshake timeout: seconds, or a duration such as "5s" or "1m"
        #[arg(long, default_value = "10")]
        timeout: String,
        /// PEM file containing trusted CA certificates (default: system trust store)
        #[arg(long = "CAfile", visible_alias = "ca-file", value_name = "FILE")]
        ca_file: Option<PathBuf>,
        /// Validate a PEM chain (leaf first) instead of connecting ("-" reads stdin)
        #[arg(long, value_name = "FILE")]
        chain_file: Option<PathBuf>,
        /// Validate at a specific Unix timestamp instead of current time
        #[arg(long, value_name = "EPOCH")]
        attime: Option<i64>,
        /// Print the JSON report to stdout instead of the console trace
        #[arg(long)]
        json: bool,
        /// Display subject and issuer for each certificate in the chain
        #[arg(long)]
        show_chain: bool,
        /// Exit with status 2 when any check FAILED
        #[arg(long)]
        fail_on_error: bool,
    },
}

/// Maximum file size for certificate and domain list inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Parse a duration string using humantime format.
///
/// Plain numbers (e.g. "10") default to seconds. Otherwise, standard
/// humantime units are accepted: `ms`, `s`, `m`, `h`, etc.
fn parse_duration(s: &str) -> Result<Duration> {
    // Plain integer → treat as seconds
    if s.chars().all(|c| c.is_ascii_digit()) {
        let secs: u64 = s.parse().context("Invalid duration value")?;
        return nonzero(Duration::from_secs(secs), s);
    }
    let duration =
        humantime::parse_duration(s).with_context(|| format!("Invalid duration: '{s}'"))?;
    nonzero(duration, s)
}

fn nonzero(duration: Duration, s: &str) -> Result<Duration> {
    if duration.is_zero() {
        anyhow::bail!("Timeout must be greater than zero: '{s}'");
    }
    Ok(duration)
}

/// Accepted shapes of a domains file.
#[derive(Deserialize)]
#[serde(untagged)]
enum DomainList {
    Bare(Vec<String>),
    Object { domains: Vec<String> },
}

fn parse_domain_list(input: &[u8]) -> Result<Vec<String>> {
    let list: DomainList = serde_json::from_slice(input).context(
        "Invalid domains file: expected a JSON array of hostnames or {\"domains\": [...]}",
    )?;
    let domains = match list {
        DomainList::Bare(domains) | DomainList::Object { domains } => domains,
    };
    if domains.is_empty() {
        anyhow::bail!("Domains file lists no hostnames");
    }
    Ok(domains)
}

/// Hostnames to validate: the positional one, or the list in `--multiple`.
fn select_domains(
    hostname: Option<&str>,
    multiple: Option<&PathBuf>,
    has_chain_file: bool,
) -> Result<Vec<String>> {
    match (multiple, hostname) {
        (Some(_), Some(_)) => anyhow::bail!("A hostname cannot be combined with --multiple"),
        (Some(_), None) if has_chain_file => {
            anyhow::bail!("--chain-file cannot be combined with --multiple")
        }
        (Some(path), None) => parse_domain_list(&read_input(Some(path))?)
            .with_context(|| format!("Failed to load domains from {}", path.display())),
        (None, Some(hostname)) => Ok(vec![hostname.to_owned()]),
        (None, None) => anyhow::bail!("A hostname is required unless --multiple is given"),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_trust_store(ca_file: Option<&PathBuf>) -> Result<TrustStore> {
    match ca_file {
        Some(path) => TrustStore::from_pem_file(path)
            .with_context(|| format!("Failed to load CA file: {}", path.display())),
        None => Ok(TrustStore::system().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "no system trust store found, every chain will be untrusted");
            TrustStore::new()
        })),
    }
}

/// Print the console trace for one hostname.
fn print_validation(validation: &Validation, port: u16, verbose: bool, show_chain: bool) {
    let run = &validation.run;
    println!("🔍 Validating SSL certificate for {}:{}", run.hostname(), port);
    print!("{}", certaudit_lib::render_results(run.results()));

    if let Some(chain) = &validation.chain {
        if verbose {
            if let Some(leaf) = chain.leaf() {
                print!("{}", certaudit_lib::render_certificate(leaf));
            }
        }
        if show_chain {
            println!("Certificate chain:");
            print!("{}", certaudit_lib::render_chain(chain));
        }
    }

    let summary = run.summary();
    print!("{}", certaudit_lib::render_summary(&summary));
    print!("{}", certaudit_lib::render_verdict(&summary));
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Validate {
            hostname,
            port,
            output,
            verbose,
            multiple,
            timeout,
            ca_file,
            chain_file,
            attime,
            json,
            show_chain,
            fail_on_error,
        } => {
            init_tracing(*verbose);

            let domains =
                select_domains(hostname.as_deref(), multiple.as_ref(), chain_file.is_some())?;

            let options = ValidateOptions {
                port: *port,
                timeout: parse_duration(timeout)?,
                at_time: *attime,
            };
            let validator = Validator::new(load_trust_store(ca_file.as_ref())?, options);

            let offline = match chain_file {
                Some(path) => {
                    let data = read_input(Some(path).filter(|p| p.as_os_str() != "-"))?;
                    Some(
                        ServedChain::from_pem(path.display().to_string(), &data)
                            .with_context(|| format!("Failed to read chain: {}", path.display()))?,
                    )
                }
                None => None,
            };

            let mut tests: Vec<ValidationTestResult> = Vec::new();
            for domain in &domains {
                let validation = match &offline {
                    Some(served) => validator.validate_served(domain, served),
                    None => validator.validate_host(domain),
                };
                if !*json {
                    print_validation(&validation, *port, *verbose, *show_chain);
                    println!();
                }
                tests.extend(validation.run.into_results());
            }

            let report = ValidationReport::new(tests, validator.now());
            if domains.len() > 1 && !*json {
                println!("Overall:");
                print!("{}", certaudit_lib::render_summary(&report.summary));
            }
            if *json {
                println!("{}", report.to_json()?);
            }
            if let Some(path) = output {
                report
                    .write_to(path)
                    .with_context(|| format!("Failed to write report: {}", path.display()))?;
                if !*json {
                    println!("📄 Report saved to {}", path.display());
                }
            }

            if *fail_on_error && report.summary.failed > 0 {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
