//! Checks on requested extensions, key usages and CA status.

use super::usage::{ext_key_usage_short_name, normalize_ext_key_usages, normalize_key_usages};
use super::{ConfigError, PolicyViolation, ValidationContext, ValidationError, Validator};
use crate::fields::{ExtensionKind, ExtensionValue, KeyUsageFlag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Only whitelisted extensions may appear in the request.
///
/// An extension is allowed when either its short name (e.g.
/// `subjectAltName`) or its dotted OID is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionsCheck {
    pub allowed_extensions: Vec<String>,
}

impl Validator for ExtensionsCheck {
    fn name(&self) -> &'static str {
        "extensions"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        for ext in ctx.csr.extensions() {
            let listed = self
                .allowed_extensions
                .iter()
                .any(|allowed| *allowed == ext.name || *allowed == ext.oid);
            if !listed {
                return Err(PolicyViolation::ExtensionNotAllowed {
                    name: ext.name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Only allowed key usage bits may be requested.
///
/// Every Key Usage extension is inspected and all denied bits are reported
/// together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyUsageCheck {
    pub allowed_usage: Vec<String>,
}

impl Validator for KeyUsageCheck {
    fn name(&self) -> &'static str {
        "key_usage"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let allowed = normalize_key_usages(&self.allowed_usage)?;

        let mut denied: BTreeSet<KeyUsageFlag> = BTreeSet::new();
        for ext in ctx.csr.extensions_of_kind(ExtensionKind::KeyUsage) {
            if let ExtensionValue::KeyUsage(flags) = &ext.value {
                denied.extend(flags.difference(&allowed));
            }
        }

        if denied.is_empty() {
            Ok(())
        } else {
            Err(PolicyViolation::KeyUsageNotAllowed {
                denied: denied.iter().map(|f| f.name().to_string()).collect(),
            }
            .into())
        }
    }

    fn preflight(&self) -> Result<(), ConfigError> {
        normalize_key_usages(&self.allowed_usage).map(|_| ())
    }
}

/// Only allowed extended key usages may be requested.
///
/// `allowed_usage` entries may be long names ("TLS Web Server
/// Authentication"), short names ("serverAuth") or dotted OIDs. They are
/// resolved into a new set on every call; the configuration itself is
/// never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtKeyUsageCheck {
    pub allowed_usage: Vec<String>,
}

impl Validator for ExtKeyUsageCheck {
    fn name(&self) -> &'static str {
        "ext_key_usage"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let allowed = normalize_ext_key_usages(&self.allowed_usage)?;

        let mut denied: BTreeSet<&str> = BTreeSet::new();
        for ext in ctx.csr.extensions_of_kind(ExtensionKind::ExtendedKeyUsage) {
            if let ExtensionValue::ExtendedKeyUsage(usages) = &ext.value {
                denied.extend(
                    usages
                        .iter()
                        .filter(|usage| !allowed.contains(usage.as_str()))
                        .map(String::as_str),
                );
            }
        }

        if denied.is_empty() {
            Ok(())
        } else {
            Err(PolicyViolation::ExtKeyUsageNotAllowed {
                denied: denied
                    .into_iter()
                    .map(|oid| ext_key_usage_short_name(oid).to_string())
                    .collect(),
            }
            .into())
        }
    }

    fn preflight(&self) -> Result<(), ConfigError> {
        normalize_ext_key_usages(&self.allowed_usage).map(|_| ())
    }
}

/// The request's CA signals must agree with `ca_requested`.
///
/// BasicConstraints `CA:TRUE`, or a Key Usage with keyCertSign or cRLSign,
/// are only allowed when a CA certificate was requested; and a CA request
/// must carry at least one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaStatusCheck {
    pub ca_requested: bool,
}

impl Validator for CaStatusCheck {
    fn name(&self) -> &'static str {
        "ca_status"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let mut has_ca_flags = false;

        for ext in ctx.csr.extensions() {
            match &ext.value {
                ExtensionValue::BasicConstraints { ca: true, .. } => {
                    if !self.ca_requested {
                        return Err(PolicyViolation::CaNotAllowed.into());
                    }
                    has_ca_flags = true;
                }
                ExtensionValue::KeyUsage(flags) => {
                    let key_cert_sign = flags.contains(&KeyUsageFlag::KeyCertSign);
                    let crl_sign = flags.contains(&KeyUsageFlag::CrlSign);
                    if key_cert_sign || crl_sign {
                        if !self.ca_requested {
                            return Err(PolicyViolation::KeyUsageCaMismatch {
                                key_cert_sign,
                                crl_sign,
                            }
                            .into());
                        }
                        has_ca_flags = true;
                    }
                }
                ExtensionValue::BasicConstraints { ca: false, .. }
                | ExtensionValue::SubjectAltName(_)
                | ExtensionValue::ExtendedKeyUsage(_)
                | ExtensionValue::Other(_) => {}
            }
        }

        if self.ca_requested && !has_ca_flags {
            return Err(PolicyViolation::CaFlagsRequired.into());
        }
        Ok(())
    }
}
