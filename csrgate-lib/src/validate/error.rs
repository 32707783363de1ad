//! Rejection signals returned by the checks.

use crate::fields::SanType;
use std::fmt;

/// Why a check did not accept a request.
///
/// A [`PolicyViolation`] means the request itself breaks a rule and the
/// requester has to change it. A [`ConfigError`] means the policy, or the
/// way the check was invoked, is wrong and an operator has to fix it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ValidationError {
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, ValidationError::Policy(_))
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, ValidationError::Config(_))
    }

    /// The policy violation, if this is one.
    pub fn policy(&self) -> Option<&PolicyViolation> {
        match self {
            ValidationError::Policy(v) => Some(v),
            ValidationError::Config(_) => None,
        }
    }

    /// The configuration error, if this is one.
    pub fn config(&self) -> Option<&ConfigError> {
        match self {
            ValidationError::Config(c) => Some(c),
            ValidationError::Policy(_) => None,
        }
    }
}

/// A request that breaks the configured policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Too many CNs in the request")]
    TooManyCommonNames,

    #[error("No CN found in the request")]
    NoCommonName,

    #[error("Alt subjects have to exist if the main subject doesn't")]
    NoSubjectIdentity,

    #[error("Alt name '{value}' of type {san_type} not allowed in the request")]
    UnexpectedAltNameType { san_type: SanType, value: String },

    #[error("Domain '{name}' not allowed (does not match known domains)")]
    DomainNotAllowed { name: String },

    #[error("Address '{address}' not allowed (does not match known networks)")]
    NetworkNotAllowed { address: String },

    #[error("Domain '{name}' not allowed ({location} blacklisted)")]
    NameBlacklisted { name: String, location: NameLocation },

    #[error("Server prefix '{prefix}' doesn't match user groups")]
    GroupMismatch { prefix: String },

    #[error("Extension '{name}' not allowed")]
    ExtensionNotAllowed { name: String },

    #[error("Found some prohibited key usages: {}", .denied.join(", "))]
    KeyUsageNotAllowed { denied: Vec<String> },

    #[error("Found some prohibited extended key usages: {}", .denied.join(", "))]
    ExtKeyUsageNotAllowed { denied: Vec<String> },

    #[error("CA status requested, but not allowed")]
    CaNotAllowed,

    #[error(
        "Key usage doesn't match requested CA status \
         (keyCertSign/cRLSign: {key_cert_sign}/{crl_sign})"
    )]
    KeyUsageCaMismatch { key_cert_sign: bool, crl_sign: bool },

    #[error("CA flags required")]
    CaFlagsRequired,

    #[error("No network matched the request source '{address}'")]
    SourceNotAllowed { address: String },

    #[error("Signature on the CSR is not valid")]
    InvalidSignature,
}

/// Where a blacklisted name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLocation {
    CommonName,
    AltName,
}

impl fmt::Display for NameLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameLocation::CommonName => f.write_str("CN"),
            NameLocation::AltName => f.write_str("alt"),
        }
    }
}

/// A policy that cannot be evaluated as written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown usage: {usage}")]
    UnknownUsage { usage: String },

    #[error("Cidr '{cidr}' does not describe a valid network")]
    InvalidCidr { cidr: String },

    #[error("check '{check}' requires an authentication result")]
    MissingAuthResult { check: &'static str },

    #[error("check '{check}' requires request metadata")]
    MissingRequestMetadata { check: &'static str },
}
