//! Checks on the names a request asks to be certified for.

use super::{
    ConfigError, NameLocation, PolicyViolation, ValidationContext, ValidationError, Validator,
};
use crate::check::{domain_matches, network_contains, IpNetwork};
use crate::extract::{alternative_names, count_cn, require_single_cn};
use crate::fields::{SanEntry, SanType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Parse every network in `cidrs`, reporting the first malformed one.
fn preflight_networks(cidrs: &[String]) -> Result<(), ConfigError> {
    for cidr in cidrs {
        cidr.parse::<IpNetwork>()?;
    }
    Ok(())
}

fn check_domain(name: &str, allowed_domains: &[String]) -> Result<(), PolicyViolation> {
    if domain_matches(name, allowed_domains) {
        Ok(())
    } else {
        Err(PolicyViolation::DomainNotAllowed {
            name: name.to_string(),
        })
    }
}

fn check_network(address: &str, allowed_networks: &[String]) -> Result<(), ValidationError> {
    if network_contains(address, allowed_networks)? {
        Ok(())
    } else {
        Err(PolicyViolation::NetworkNotAllowed {
            address: address.to_string(),
        }
        .into())
    }
}

/// RFC 5280 Section 4.2.1.6: the subject must be usable.
///
/// At most one CN is allowed, and a request without a CN must carry a
/// subjectAltName extension. A CN that parses as an IP address is checked
/// against `allowed_networks` and never against `allowed_domains`; any
/// other CN must match `allowed_domains`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommonNameCheck {
    pub allowed_domains: Vec<String>,
    pub allowed_networks: Vec<String>,
}

impl Validator for CommonNameCheck {
    fn name(&self) -> &'static str {
        "common_name"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let csr = ctx.csr;
        match count_cn(csr) {
            0 if csr.has_subject_alt_name() => return Ok(()),
            0 => return Err(PolicyViolation::NoSubjectIdentity.into()),
            1 => {}
            _ => return Err(PolicyViolation::TooManyCommonNames.into()),
        }

        let cn = require_single_cn(csr)?;
        if cn.parse::<IpAddr>().is_ok() {
            check_network(cn, &self.allowed_networks)
        } else {
            check_domain(cn, &self.allowed_domains).map_err(Into::into)
        }
    }

    fn preflight(&self) -> Result<(), ConfigError> {
        preflight_networks(&self.allowed_networks)
    }
}

/// Every DNS subjectAltName must be within `allowed_domains`.
///
/// Entries of other types are skipped unless `reject_other_types` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlternativeNamesCheck {
    pub allowed_domains: Vec<String>,
    pub reject_other_types: bool,
}

impl Validator for AlternativeNamesCheck {
    fn name(&self) -> &'static str {
        "alternative_names"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        for entry in alternative_names(ctx.csr, &[SanType::Dns], self.reject_other_types) {
            check_domain(entry?.value(), &self.allowed_domains)?;
        }
        Ok(())
    }
}

/// Every DNS subjectAltName must be within `allowed_domains` and every IP
/// subjectAltName within `allowed_networks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlternativeNamesIpCheck {
    pub allowed_domains: Vec<String>,
    pub allowed_networks: Vec<String>,
    pub reject_other_types: bool,
}

impl Validator for AlternativeNamesIpCheck {
    fn name(&self) -> &'static str {
        "alternative_names_ip"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let wanted = [SanType::Dns, SanType::Ip];
        for entry in alternative_names(ctx.csr, &wanted, self.reject_other_types) {
            match entry? {
                SanEntry::Dns(name) => check_domain(name, &self.allowed_domains)?,
                SanEntry::Ip(address) => check_network(address, &self.allowed_networks)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn preflight(&self) -> Result<(), ConfigError> {
        preflight_networks(&self.allowed_networks)
    }
}

/// Reject requests whose CN or DNS alternative names fall under a
/// blacklisted domain.
///
/// An empty blacklist accepts everything and raises a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlacklistNamesCheck {
    pub domains: Vec<String>,
}

impl Validator for BlacklistNamesCheck {
    fn name(&self) -> &'static str {
        "blacklist_names"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        if self.domains.is_empty() {
            ctx.sink.warn(
                self.name(),
                "No domains were configured for the blacklist filter, \
                 consider disabling the step or providing a list",
            );
            return Ok(());
        }

        let csr = ctx.csr;
        if count_cn(csr) > 0 {
            let cn = require_single_cn(csr)?;
            if domain_matches(cn, &self.domains) {
                return Err(PolicyViolation::NameBlacklisted {
                    name: cn.to_string(),
                    location: NameLocation::CommonName,
                }
                .into());
            }
        }

        for entry in alternative_names(csr, &[SanType::Dns], false) {
            let name = entry?.value();
            if domain_matches(name, &self.domains) {
                return Err(PolicyViolation::NameBlacklisted {
                    name: name.to_string(),
                    location: NameLocation::AltName,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Server names of the form `<prefix>-<rest>` may only be requested by
/// members of the group mapped to `<prefix>`.
///
/// Names without a `-`, or whose first segment contains a `.` (a domain
/// label rather than a team prefix), are not constrained. Prefixes missing
/// from `group_prefixes` are not constrained either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerGroupCheck {
    pub group_prefixes: BTreeMap<String, String>,
}

impl Validator for ServerGroupCheck {
    fn name(&self) -> &'static str {
        "server_group"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let cn = require_single_cn(ctx.csr)?;
        let Some((prefix, _)) = cn.split_once('-') else {
            return Ok(());
        };
        if prefix.contains('.') {
            return Ok(());
        }

        let Some(group) = self.group_prefixes.get(prefix) else {
            return Ok(());
        };
        let auth = ctx
            .auth
            .ok_or(ConfigError::MissingAuthResult { check: self.name() })?;
        if auth.is_member(group) {
            Ok(())
        } else {
            Err(PolicyViolation::GroupMismatch {
                prefix: prefix.to_string(),
            }
            .into())
        }
    }
}
