//! Certificate request parsing from PEM and DER formats.

use crate::fields::{
    CertificateRequest, DistinguishedName, Extension, ExtensionValue, KeyUsageFlag, SanEntry,
};
use crate::oid;
use crate::util;
use crate::CsrgateError;
use std::collections::BTreeSet;
use x509_parser::cri_attributes::ParsedCriAttribute;
use x509_parser::der_parser::asn1_rs::Tag;
use x509_parser::prelude::*;

/// PEM labels accepted for PKCS#10 requests.
const CSR_PEM_LABELS: [&str; 2] = ["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Parse a certificate request from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_csr(input: &[u8]) -> Result<CertificateRequest, CsrgateError> {
    if input.is_empty() {
        return Err(CsrgateError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse a certificate request from PEM format.
pub fn parse_pem(input: &[u8]) -> Result<CertificateRequest, CsrgateError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| CsrgateError::PemError(format!("{}", e)))?;

    if !CSR_PEM_LABELS.contains(&pem.label.as_str()) {
        return Err(CsrgateError::PemError(format!(
            "expected CERTIFICATE REQUEST, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// Parse a certificate request from DER format.
pub fn parse_der(input: &[u8]) -> Result<CertificateRequest, CsrgateError> {
    let (remaining, csr) = X509CertificationRequest::from_der(input)
        .map_err(|e| CsrgateError::DerError(format!("{}", e)))?;

    // Keep only the request bytes, not any trailing data.
    let csr_len = input.len() - remaining.len();
    let csr_der = input.get(..csr_len).unwrap_or(input);
    build_certificate_request(&csr, csr_der)
}

fn build_certificate_request(
    csr: &X509CertificationRequest,
    raw_der: &[u8],
) -> Result<CertificateRequest, CsrgateError> {
    let info = &csr.certification_request_info;

    let raw_version = info.version.0;
    if raw_version != 0 {
        return Err(CsrgateError::ParseError(format!(
            "unsupported PKCS#10 version {} (expected v1)",
            raw_version + 1
        )));
    }

    let subject = build_dn(&info.subject)?;

    let mut extensions = Vec::new();
    for attr in info.iter_attributes() {
        if let ParsedCriAttribute::ExtensionRequest(req) = attr.parsed_attribute() {
            for ext in &req.extensions {
                extensions.push(build_extension(ext)?);
            }
        }
    }

    Ok(CertificateRequest {
        subject,
        extensions,
        raw_der: raw_der.to_vec(),
    })
}

pub(crate) fn build_dn(name: &X509Name) -> Result<DistinguishedName, CsrgateError> {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = attr.attr_type().to_id_string();
            let value = attribute_value(attr).ok_or_else(|| {
                CsrgateError::ParseError(format!("undecodable value for attribute {}", key))
            })?;
            components.push((key, value));
        }
    }
    Ok(DistinguishedName { components })
}

/// Decode an attribute value as text. Every DirectoryString encoding is
/// accepted; anything else has no text form.
fn attribute_value(attr: &AttributeTypeAndValue) -> Option<String> {
    if let Ok(s) = attr.as_str() {
        return Some(s.to_string());
    }
    let value = attr.attr_value();
    match value.header.tag() {
        Tag::BmpString => util::decode_bmp_string(value.data),
        Tag::UniversalString => util::decode_universal_string(value.data),
        Tag::T61String => Some(util::decode_teletex_string(value.data)),
        _ => None,
    }
}

fn build_extension(ext: &X509Extension) -> Result<Extension, CsrgateError> {
    let oid_str = ext.oid.to_id_string();

    let value = match ext.parsed_extension() {
        ParsedExtension::BasicConstraints(bc) => ExtensionValue::BasicConstraints {
            ca: bc.ca,
            path_len: bc.path_len_constraint,
        },
        ParsedExtension::KeyUsage(ku) => {
            let bits = [
                (ku.digital_signature(), KeyUsageFlag::DigitalSignature),
                (ku.non_repudiation(), KeyUsageFlag::NonRepudiation),
                (ku.key_encipherment(), KeyUsageFlag::KeyEncipherment),
                (ku.data_encipherment(), KeyUsageFlag::DataEncipherment),
                (ku.key_agreement(), KeyUsageFlag::KeyAgreement),
                (ku.key_cert_sign(), KeyUsageFlag::KeyCertSign),
                (ku.crl_sign(), KeyUsageFlag::CrlSign),
                (ku.encipher_only(), KeyUsageFlag::EncipherOnly),
                (ku.decipher_only(), KeyUsageFlag::DecipherOnly),
            ];
            let usages: BTreeSet<KeyUsageFlag> = bits
                .into_iter()
                .filter_map(|(set, flag)| set.then_some(flag))
                .collect();
            ExtensionValue::KeyUsage(usages)
        }
        ParsedExtension::ExtendedKeyUsage(eku) => {
            let known = [
                (eku.any, oid::EKU_ANY),
                (eku.server_auth, oid::EKU_SERVER_AUTH),
                (eku.client_auth, oid::EKU_CLIENT_AUTH),
                (eku.code_signing, oid::EKU_CODE_SIGNING),
                (eku.email_protection, oid::EKU_EMAIL_PROTECTION),
                (eku.time_stamping, oid::EKU_TIME_STAMPING),
                (eku.ocsp_signing, oid::EKU_OCSP_SIGNING),
            ];
            let mut usages: Vec<String> = known
                .into_iter()
                .filter_map(|(set, usage)| set.then(|| usage.to_string()))
                .collect();
            usages.extend(eku.other.iter().map(|o| o.to_id_string()));
            ExtensionValue::ExtendedKeyUsage(usages)
        }
        ParsedExtension::SubjectAlternativeName(san) => {
            let entries = san
                .general_names
                .iter()
                .map(general_name_to_san_entry)
                .collect::<Result<_, _>>()?;
            ExtensionValue::SubjectAltName(entries)
        }
        ParsedExtension::ParseError { error } => {
            // Interpreted extensions must decode; only unknown ones fall back to raw.
            if is_interpreted_extension(&oid_str) {
                return Err(CsrgateError::ParseError(format!(
                    "malformed {} extension: {}",
                    oid_str, error
                )));
            }
            ExtensionValue::Other(hex::encode(ext.value))
        }
        _ => ExtensionValue::Other(hex::encode(ext.value)),
    };

    Ok(Extension::new(&oid_str, ext.critical, value))
}

/// Extensions whose values the policy checks depend on.
fn is_interpreted_extension(oid_str: &str) -> bool {
    matches!(
        oid_str,
        oid::EXT_SUBJECT_ALT_NAME
            | oid::EXT_BASIC_CONSTRAINTS
            | oid::EXT_KEY_USAGE
            | oid::EXT_EXTENDED_KEY_USAGE
    )
}

fn general_name_to_san_entry(gn: &GeneralName) -> Result<SanEntry, CsrgateError> {
    let entry = match gn {
        GeneralName::DNSName(name) => SanEntry::Dns(name.to_string()),
        GeneralName::RFC822Name(email) => SanEntry::Email(email.to_string()),
        GeneralName::IPAddress(ip_bytes) => SanEntry::Ip(util::format_ip_bytes(ip_bytes)),
        GeneralName::URI(uri) => SanEntry::Uri(uri.to_string()),
        GeneralName::DirectoryName(dn) => SanEntry::DirName(build_dn(dn)?.to_oneline()),
        other => SanEntry::Other(format!("{:?}", other)),
    };
    Ok(entry)
}
