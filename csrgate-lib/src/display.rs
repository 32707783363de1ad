//! Human-readable and JSON formatting of certificate requests.

use crate::fields::{CertificateRequest, Extension, ExtensionValue, SanEntry};
use crate::validate::usage::ext_key_usage_short_name;
use crate::CsrgateError;

/// Maximum number of hex characters shown for uninterpreted extensions.
const RAW_PREVIEW_LEN: usize = 40;

/// Format a certificate request as human-readable text.
pub fn display_text(csr: &CertificateRequest) -> String {
    let mut out = String::new();

    out.push_str("Certificate Request:\n");
    out.push_str(&format!("  Subject: {}\n", csr.subject_string()));

    if !csr.extensions.is_empty() {
        out.push_str("  Requested Extensions:\n");
        for ext in &csr.extensions {
            format_extension(&mut out, ext);
        }
    }

    out
}

fn format_extension(out: &mut String, ext: &Extension) {
    let critical_str = if ext.critical { " [critical]" } else { "" };

    match &ext.value {
        ExtensionValue::BasicConstraints { ca, path_len } => {
            let pl = match path_len {
                Some(n) => format!(", pathlen:{}", n),
                None => String::new(),
            };
            out.push_str(&format!(
                "    Basic Constraints:{} CA={}{}\n",
                critical_str, ca, pl
            ));
        }
        ExtensionValue::KeyUsage(usages) => {
            let names: Vec<&str> = usages.iter().map(|u| u.long_name()).collect();
            out.push_str(&format!(
                "    Key Usage:{} {}\n",
                critical_str,
                names.join(", ")
            ));
        }
        ExtensionValue::ExtendedKeyUsage(usages) => {
            let names: Vec<&str> = usages
                .iter()
                .map(|u| ext_key_usage_short_name(u))
                .collect();
            out.push_str(&format!(
                "    Extended Key Usage:{} {}\n",
                critical_str,
                names.join(", ")
            ));
        }
        ExtensionValue::SubjectAltName(entries) => {
            out.push_str(&format!("    Subject Alternative Name:{}\n", critical_str));
            for entry in entries {
                match entry {
                    SanEntry::Dns(name) => out.push_str(&format!("      DNS: {}\n", name)),
                    SanEntry::Email(email) => out.push_str(&format!("      Email: {}\n", email)),
                    SanEntry::Ip(ip) => out.push_str(&format!("      IP: {}\n", ip)),
                    SanEntry::Uri(uri) => out.push_str(&format!("      URI: {}\n", uri)),
                    SanEntry::DirName(dn) => out.push_str(&format!("      DirName: {}\n", dn)),
                    SanEntry::Other(s) => out.push_str(&format!("      Other: {}\n", s)),
                }
            }
        }
        ExtensionValue::Other(hex) => {
            out.push_str(&format!(
                "    {} ({}):{}",
                ext.name, ext.oid, critical_str
            ));
            match hex.get(..RAW_PREVIEW_LEN) {
                Some(preview) if hex.len() > RAW_PREVIEW_LEN => {
                    out.push_str(&format!(" {}...\n", preview))
                }
                _ => out.push_str(&format!(" {}\n", hex)),
            }
        }
    }
}

/// Serialize a certificate request to a pretty-printed JSON string.
pub fn to_json(csr: &CertificateRequest) -> Result<String, CsrgateError> {
    serde_json::to_string_pretty(csr).map_err(CsrgateError::Json)
}
