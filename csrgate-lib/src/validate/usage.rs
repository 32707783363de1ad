//! Key usage and extended key usage vocabularies.

use super::ConfigError;
use crate::fields::KeyUsageFlag;
use crate::oid;
use crate::util;
use std::collections::BTreeSet;

/// Registered extended key usages: (OID, short name, long name).
const EXT_KEY_USAGES: [(&str, &str, &str); 12] = [
    (oid::EKU_SERVER_AUTH, "serverAuth", "TLS Web Server Authentication"),
    (oid::EKU_CLIENT_AUTH, "clientAuth", "TLS Web Client Authentication"),
    (oid::EKU_CODE_SIGNING, "codeSigning", "Code Signing"),
    (oid::EKU_EMAIL_PROTECTION, "emailProtection", "E-mail Protection"),
    (oid::EKU_TIME_STAMPING, "timeStamping", "Time Stamping"),
    (oid::EKU_OCSP_SIGNING, "OCSPSigning", "OCSP Signing"),
    (oid::EKU_IPSEC_END_SYSTEM, "ipsecEndSystem", "IPSec End System"),
    (oid::EKU_IPSEC_TUNNEL, "ipsecTunnel", "IPSec Tunnel"),
    (oid::EKU_IPSEC_USER, "ipsecUser", "IPSec User"),
    (oid::EKU_MS_SERVER_GATED_CRYPTO, "msSGC", "Microsoft Server Gated Crypto"),
    (oid::EKU_NS_SERVER_GATED_CRYPTO, "nsSGC", "Netscape Server Gated Crypto"),
    (oid::EKU_ANY, "anyExtendedKeyUsage", "Any Extended Key Usage"),
];

/// Resolve an extended key usage to its OID.
///
/// Tries the long registered name, then the short registered name, then
/// dotted OID syntax.
pub fn resolve_ext_key_usage(usage: &str) -> Option<String> {
    EXT_KEY_USAGES
        .iter()
        .find(|(_, _, long)| *long == usage)
        .or_else(|| EXT_KEY_USAGES.iter().find(|(_, short, _)| *short == usage))
        .map(|(oid, _, _)| oid.to_string())
        .or_else(|| util::parse_dotted_oid(usage))
}

/// Short name for a registered extended key usage OID, or the OID itself.
pub fn ext_key_usage_short_name(oid_str: &str) -> &str {
    EXT_KEY_USAGES
        .iter()
        .find(|(oid, _, _)| *oid == oid_str)
        .map_or(oid_str, |(_, short, _)| *short)
}

/// Normalize configured extended key usages into a fresh set of OIDs.
///
/// Fails on the first entry that is neither a registered name nor an OID.
pub fn normalize_ext_key_usages<S: AsRef<str>>(
    allowed: &[S],
) -> Result<BTreeSet<String>, ConfigError> {
    allowed
        .iter()
        .map(|usage| {
            let usage = usage.as_ref();
            resolve_ext_key_usage(usage).ok_or_else(|| ConfigError::UnknownUsage {
                usage: usage.to_string(),
            })
        })
        .collect()
}

/// Normalize configured key usage names into flags.
pub fn normalize_key_usages<S: AsRef<str>>(
    allowed: &[S],
) -> Result<BTreeSet<KeyUsageFlag>, ConfigError> {
    allowed
        .iter()
        .map(|usage| {
            let usage = usage.as_ref();
            KeyUsageFlag::from_name(usage).ok_or_else(|| ConfigError::UnknownUsage {
                usage: usage.to_string(),
            })
        })
        .collect()
}
