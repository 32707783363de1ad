//! csrgate: Command-line tool for admitting certificate signing requests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csrgate_lib::{
    AdmissionPolicy, AdmissionResult, AuthResult, CertificateRequest, EvaluationMode,
    RequestMetadata, ValidationContext,
};
use rayon::prelude::*;
use std::io::Read;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Exit status when a request is rejected.
const EXIT_REJECTED: i32 = 1;
/// Exit status when the policy itself is broken.
const EXIT_CONFIG: i32 = 2;

#[derive(Parser)]
#[command(
    name = "csrgate",
    about = "Evaluate certificate signing requests against an admission policy",
    long_about = "csrgate parses PKCS#10 certificate signing requests in PEM or DER\n\
                  format and decides whether they may be signed, according to an\n\
                  ordered policy of checks loaded from a JSON file.\n\n\
                  Input format (PEM vs DER) is auto-detected unless --pem or --der\n\
                  is specified. All commands read from stdin when no file is given.",
    after_help = "EXAMPLES:\n\
                  \n  csrgate show request.csr\
                  \n  csrgate show --json request.csr\
                  \n  csrgate check --policy policy.json request.csr\
                  \n  csrgate check --policy policy.json --group nova --client-addr 10.0.0.5 request.csr\
                  \n  csrgate lint policy.json\
                  \n  cat request.csr | csrgate check --policy policy.json"
)]
struct Cli {
    /// Log filter (e.g. "warn", "debug", "csrgate_lib=debug")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the contents of a certificate signing request
    #[command(after_help = "EXAMPLES:\n\
                      \n  csrgate show request.csr\
                      \n  csrgate show --json request.csr\
                      \n  csrgate show --der request.der\
                      \n  cat request.csr | csrgate show")]
    Show {
        /// Request file (PEM or DER). Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Force DER input parsing (default: auto-detect)
        #[arg(long)]
        der: bool,
        /// Force PEM input parsing (default: auto-detect)
        #[arg(long)]
        pem: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Evaluate requests against a policy (exit 0 = accepted, 1 = rejected, 2 = bad policy)
    #[command(after_help = "POLICY FORMAT:\n\
                      \n  {\"mode\": \"fail_fast\", \"checks\": [\
                      \n    {\"check\": \"common_name\", \"allowed_domains\": [\".example.com\"]},\
                      \n    {\"check\": \"key_usage\", \"allowed_usage\": [\"digitalSignature\"]},\
                      \n    {\"check\": \"csr_signature\"}\
                      \n  ]}\
                      \n\nEXAMPLES:\n\
                      \n  csrgate check --policy policy.json request.csr\
                      \n  csrgate check --policy policy.json --collect-all request.csr\
                      \n  csrgate check --policy policy.json --group nova request.csr\
                      \n  csrgate check --policy policy.json --client-addr 10.0.0.5 request.csr\
                      \n  csrgate check --policy policy.json --failures-only requests/")]
    Check {
        /// JSON policy file
        #[arg(long, value_name = "FILE")]
        policy: PathBuf,
        /// Group the requester belongs to (repeatable)
        #[arg(long = "group", value_name = "GROUP")]
        groups: Vec<String>,
        /// Network address the request arrived from
        #[arg(long, value_name = "IP")]
        client_addr: Option<IpAddr>,
        /// Report every failing check instead of stopping at the first
        #[arg(long)]
        collect_all: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Force DER input parsing (default: auto-detect)
        #[arg(long)]
        der: bool,
        /// Force PEM input parsing (default: auto-detect)
        #[arg(long)]
        pem: bool,
        /// Only print rejected requests
        #[arg(long)]
        failures_only: bool,
        /// Recurse into subdirectories (directory mode)
        #[arg(short, long)]
        recurse: bool,
        /// Request files or directories. Reads from stdin if omitted.
        files: Vec<PathBuf>,
    },
    /// Check a policy file for configuration errors without evaluating a request
    Lint {
        /// JSON policy file
        policy: PathBuf,
    },
}

/// Maximum file size for request inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
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

fn parse_input(input: &[u8], der: bool, pem: bool) -> Result<CertificateRequest> {
    if der {
        Ok(csrgate_lib::parse_der(input)?)
    } else if pem {
        Ok(csrgate_lib::parse_pem(input)?)
    } else {
        Ok(csrgate_lib::parse_csr(input)?)
    }
}

fn load_policy(path: &Path) -> Result<AdmissionPolicy> {
    AdmissionPolicy::from_file(path)
        .with_context(|| format!("Failed to load policy: {}", path.display()))
}

/// Check if a path has a request file extension (.csr, .req, .pem or .der).
fn is_csr_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("csr") || ext.eq_ignore_ascii_case("req")
            || ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
    )
}

/// Find all request files in a directory, sorted by path.
fn find_csr_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_csr_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Expand directories among `paths` into the request files they contain.
fn expand_inputs(paths: &[PathBuf], recurse: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(find_csr_files(path, recurse));
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Outcome of evaluating one input.
#[derive(serde::Serialize)]
struct BatchResult {
    path: String,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(serde::Serialize)]
#[serde(untagged)]
enum Outcome {
    Evaluated(AdmissionResult),
    Unreadable(ReadFailure),
}

/// An input that could not be read or parsed. Always serialized as
/// rejected.
struct ReadFailure {
    error: String,
}

impl serde::Serialize for ReadFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ReadFailure", 2)?;
        state.serialize_field("accepted", &false)?;
        state.serialize_field("error", &self.error)?;
        state.end()
    }
}

impl BatchResult {
    fn accepted(&self) -> bool {
        match &self.outcome {
            Outcome::Evaluated(r) => r.accepted,
            Outcome::Unreadable(_) => false,
        }
    }

    fn config_error(&self) -> bool {
        match &self.outcome {
            Outcome::Evaluated(r) => r.has_config_errors(),
            Outcome::Unreadable(_) => false,
        }
    }

    fn detail(&self) -> String {
        match &self.outcome {
            Outcome::Evaluated(r) => r.to_string(),
            Outcome::Unreadable(failure) => format!("FAIL ({})", failure.error),
        }
    }
}

/// Everything an evaluation needs besides the request itself.
struct Evaluator<'a> {
    policy: &'a AdmissionPolicy,
    auth: Option<&'a AuthResult>,
    request: Option<&'a RequestMetadata>,
    der: bool,
    pem: bool,
}

impl Evaluator<'_> {
    fn evaluate_file(&self, label: String, file: Option<&Path>) -> BatchResult {
        let csr = match read_input(file).and_then(|input| parse_input(&input, self.der, self.pem))
        {
            Ok(csr) => csr,
            Err(e) => {
                return BatchResult {
                    path: label,
                    outcome: Outcome::Unreadable(ReadFailure {
                        error: format!("{:#}", e),
                    }),
                }
            }
        };

        let mut ctx = ValidationContext::new(&csr);
        if let Some(auth) = self.auth {
            ctx = ctx.with_auth(auth);
        }
        if let Some(request) = self.request {
            ctx = ctx.with_request(request);
        }

        BatchResult {
            path: label,
            outcome: Outcome::Evaluated(self.policy.evaluate(&ctx)),
        }
    }
}

/// Print batch results, returning the process exit status.
fn report(results: &[BatchResult], json: bool, failures_only: bool) -> Result<i32> {
    if json {
        let shown: Vec<&BatchResult> = results
            .iter()
            .filter(|r| !(failures_only && r.accepted()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        for r in results {
            if r.accepted() {
                if !failures_only {
                    println!("{}: {}", r.path, r.detail());
                }
            } else {
                eprintln!("{}: {}", r.path, r.detail());
            }
        }
    }

    if results.iter().any(BatchResult::config_error) {
        Ok(EXIT_CONFIG)
    } else if results.iter().any(|r| !r.accepted()) {
        Ok(EXIT_REJECTED)
    } else {
        Ok(0)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        Commands::Show {
            file,
            der,
            pem,
            json,
        } => {
            let input = read_input(file.as_deref())?;
            let csr = parse_input(&input, *der, *pem)?;

            if *json {
                println!("{}", csrgate_lib::to_json(&csr)?);
            } else {
                print!("{}", csrgate_lib::display_text(&csr));
            }
        }
        Commands::Check {
            policy,
            groups,
            client_addr,
            collect_all,
            json,
            der,
            pem,
            failures_only,
            recurse,
            files,
        } => {
            let mut policy = match load_policy(policy) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            };
            if *collect_all {
                policy.mode = EvaluationMode::CollectAll;
            }

            let problems = policy.preflight();
            if !problems.is_empty() {
                for p in &problems {
                    eprintln!("policy error: {}", p);
                }
                std::process::exit(EXIT_CONFIG);
            }

            let auth = (!groups.is_empty()).then(|| AuthResult::new(groups.iter().cloned()));
            let request = client_addr.map(RequestMetadata::new);
            let evaluator = Evaluator {
                policy: &policy,
                auth: auth.as_ref(),
                request: request.as_ref(),
                der: *der,
                pem: *pem,
            };

            let results = if files.is_empty() {
                vec![evaluator.evaluate_file("stdin".to_string(), None)]
            } else {
                let inputs = expand_inputs(files, *recurse);
                if inputs.is_empty() {
                    anyhow::bail!("No request files found");
                }
                inputs
                    .par_iter()
                    .map(|f| evaluator.evaluate_file(f.display().to_string(), Some(f.as_path())))
                    .collect()
            };

            let code = report(&results, *json, *failures_only)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Lint { policy } => {
            let policy = match load_policy(policy) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            };
            if policy.checks.is_empty() {
                eprintln!("warning: no checks are configured, every request will be accepted");
            }
            let problems = policy.preflight();
            if problems.is_empty() {
                println!("OK ({} checks)", policy.checks.len());
            } else {
                for p in &problems {
                    eprintln!("{}", p);
                }
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ---- is_csr_file tests ----

    #[test]
    fn is_csr_file_csr() {
        assert!(is_csr_file(Path::new("request.csr")));
    }

    #[test]
    fn is_csr_file_pem_and_der() {
        assert!(is_csr_file(Path::new("request.pem")));
        assert!(is_csr_file(Path::new("request.der")));
        assert!(is_csr_file(Path::new("request.req")));
    }

    #[test]
    fn is_csr_file_case_insensitive() {
        assert!(is_csr_file(Path::new("REQUEST.CSR")));
        assert!(is_csr_file(Path::new("request.Pem")));
    }

    #[test]
    fn is_csr_file_rejects_other_files() {
        assert!(!is_csr_file(Path::new("policy.json")));
        assert!(!is_csr_file(Path::new("request")));
    }

    // ---- find_csr_files tests ----

    #[test]
    fn find_csr_files_sorted_and_filtered() {
        let tmp = std::env::temp_dir().join("csrgate_test_find_files");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(tmp.join("nested")).unwrap();
        std::fs::write(tmp.join("b.csr"), b"x").unwrap();
        std::fs::write(tmp.join("a.pem"), b"x").unwrap();
        std::fs::write(tmp.join("policy.json"), b"{}").unwrap();
        std::fs::write(tmp.join("nested").join("c.der"), b"x").unwrap();

        let flat = find_csr_files(&tmp, false);
        assert_eq!(flat, vec![tmp.join("a.pem"), tmp.join("b.csr")]);

        let deep = find_csr_files(&tmp, true);
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&tmp.join("nested").join("c.der")));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn find_csr_files_empty_dir() {
        let tmp = std::env::temp_dir().join("csrgate_test_empty_dir");
        let _ = std::fs::create_dir(&tmp);
        let files = find_csr_files(&tmp, false);
        assert!(files.is_empty(), "empty dir should return no files");
        let _ = std::fs::remove_dir(&tmp);
    }

    // ---- report tests ----

    fn unreadable(path: &str) -> BatchResult {
        BatchResult {
            path: path.to_string(),
            outcome: Outcome::Unreadable(ReadFailure {
                error: "parse error".to_string(),
            }),
        }
    }

    #[test]
    fn unreadable_input_is_rejected() {
        let r = unreadable("bad.csr");
        assert!(!r.accepted());
        assert!(!r.config_error());
        assert_eq!(r.detail(), "FAIL (parse error)");
        assert_eq!(report(&[r], false, true).unwrap(), EXIT_REJECTED);
    }

    #[test]
    fn unreadable_input_serializes_as_rejected() {
        let value = serde_json::to_value(unreadable("bad.csr")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "path": "bad.csr",
                "accepted": false,
                "error": "parse error",
            })
        );
    }

    #[test]
    fn empty_report_exits_zero() {
        assert_eq!(report(&[], false, false).unwrap(), 0);
    }
}
