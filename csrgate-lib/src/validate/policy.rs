//! Ordered sets of checks loaded from configuration.

use super::{
    AlternativeNamesCheck, AlternativeNamesIpCheck, BlacklistNamesCheck, CaStatusCheck,
    CommonNameCheck, CsrSignatureCheck, ExtKeyUsageCheck, ExtensionsCheck, KeyUsageCheck,
    ServerGroupCheck, SourceCidrsCheck, ValidationContext, ValidationError, Validator,
};
use crate::CsrgateError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One configured check, tagged by its name.
///
/// In JSON: `{"check": "common_name", "allowed_domains": ["example.com"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CheckConfig {
    CommonName(CommonNameCheck),
    AlternativeNames(AlternativeNamesCheck),
    AlternativeNamesIp(AlternativeNamesIpCheck),
    BlacklistNames(BlacklistNamesCheck),
    ServerGroup(ServerGroupCheck),
    Extensions(ExtensionsCheck),
    KeyUsage(KeyUsageCheck),
    ExtKeyUsage(ExtKeyUsageCheck),
    CaStatus(CaStatusCheck),
    SourceCidrs(SourceCidrsCheck),
    CsrSignature(CsrSignatureCheck),
}

impl CheckConfig {
    pub fn validator(&self) -> &dyn Validator {
        match self {
            CheckConfig::CommonName(c) => c,
            CheckConfig::AlternativeNames(c) => c,
            CheckConfig::AlternativeNamesIp(c) => c,
            CheckConfig::BlacklistNames(c) => c,
            CheckConfig::ServerGroup(c) => c,
            CheckConfig::Extensions(c) => c,
            CheckConfig::KeyUsage(c) => c,
            CheckConfig::ExtKeyUsage(c) => c,
            CheckConfig::CaStatus(c) => c,
            CheckConfig::SourceCidrs(c) => c,
            CheckConfig::CsrSignature(c) => c,
        }
    }
}

/// Whether evaluation stops at the first failing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Stop at the first failure.
    #[default]
    FailFast,
    /// Run every check and report every failure.
    CollectAll,
}

/// An ordered admission policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdmissionPolicy {
    #[serde(default)]
    pub mode: EvaluationMode,
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
}

impl AdmissionPolicy {
    pub fn new(mode: EvaluationMode, checks: Vec<CheckConfig>) -> Self {
        Self { mode, checks }
    }

    /// Parse a policy from its JSON representation.
    pub fn from_json(input: &str) -> Result<Self, CsrgateError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and parse a JSON policy file.
    pub fn from_file(path: &Path) -> Result<Self, CsrgateError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// The configured checks, in evaluation order.
    pub fn validators(&self) -> impl Iterator<Item = &dyn Validator> {
        self.checks.iter().map(CheckConfig::validator)
    }

    /// Check every configuration entry without evaluating a request.
    ///
    /// Returns all problems found, in check order.
    pub fn preflight(&self) -> Vec<CheckFailure> {
        self.validators()
            .filter_map(|v| {
                v.preflight()
                    .err()
                    .map(|e| CheckFailure::new(v.name(), e.into()))
            })
            .collect()
    }

    /// Run the configured checks against one request.
    pub fn evaluate(&self, ctx: &ValidationContext<'_>) -> AdmissionResult {
        if self.checks.is_empty() {
            ctx.sink.warn(
                "admission_policy",
                "No checks are configured, every request will be accepted",
            );
        }

        let mut failures = Vec::new();
        for validator in self.validators() {
            match validator.validate(ctx) {
                Ok(()) => tracing::debug!(check = validator.name(), "check passed"),
                Err(e) => {
                    tracing::debug!(check = validator.name(), error = %e, "check failed");
                    failures.push(CheckFailure::new(validator.name(), e));
                    if self.mode == EvaluationMode::FailFast {
                        break;
                    }
                }
            }
        }

        AdmissionResult {
            accepted: failures.is_empty(),
            failures,
        }
    }
}

/// Outcome of evaluating a policy against one request.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionResult {
    /// Whether every evaluated check accepted the request.
    pub accepted: bool,
    /// Failing checks, in evaluation order (empty if `accepted` is true).
    pub failures: Vec<CheckFailure>,
}

impl AdmissionResult {
    /// Whether any failure comes from a broken configuration rather than
    /// from the request.
    pub fn has_config_errors(&self) -> bool {
        self.failures.iter().any(|f| f.kind == FailureKind::Config)
    }
}

impl std::fmt::Display for AdmissionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.accepted {
            return write!(f, "OK");
        }
        write!(f, "FAIL")?;
        let reasons: Vec<String> = self.failures.iter().map(|x| x.to_string()).collect();
        if !reasons.is_empty() {
            write!(f, ", {}", reasons.join("; "))?;
        }
        Ok(())
    }
}

/// Which side has to act on a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Policy,
    Config,
}

/// A single failing check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckFailure {
    pub check: &'static str,
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip)]
    pub error: ValidationError,
}

impl CheckFailure {
    pub fn new(check: &'static str, error: ValidationError) -> Self {
        let kind = if error.is_config_error() {
            FailureKind::Config
        } else {
            FailureKind::Policy
        };
        Self {
            check,
            kind,
            message: error.to_string(),
            error,
        }
    }
}

impl std::fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.check, self.message)
    }
}
