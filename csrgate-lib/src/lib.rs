//! csrgate-lib: Admission policy checks for certificate signing requests.
//!
//! Parses PKCS#10 requests in PEM or DER format into a read-only view and
//! evaluates them against configurable checks: allowed domains and
//! networks, blacklisted names, team naming prefixes, extension and key
//! usage whitelists, CA status, request source networks, and the request's
//! self-signature.

mod check;
mod display;
mod extract;
mod fields;
pub mod oid;
mod parser;
mod util;
pub mod validate;

pub use check::{domain_matches, network_contains, IpNetwork};
pub use display::{display_text, to_json};
pub use extract::{alternative_names, require_single_cn};
pub use fields::{
    CertificateRequest, DistinguishedName, Extension, ExtensionKind, ExtensionValue,
    KeyUsageFlag, SanEntry, SanType,
};
pub use parser::{parse_csr, parse_der, parse_pem};
pub use validate::{
    AdmissionPolicy, AdmissionResult, AuthResult, CheckConfig, CheckFailure, ConfigError,
    EvaluationMode, FailureKind, PolicyViolation, RequestMetadata, ValidationContext,
    ValidationError, Validator,
};

/// Errors returned by csrgate-lib outside of policy evaluation.
#[derive(Debug, thiserror::Error)]
pub enum CsrgateError {
    #[error("Failed to parse certificate request: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
