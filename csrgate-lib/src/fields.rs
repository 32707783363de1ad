//! Certificate request data types and field access.

use crate::oid;
use crate::CsrgateError;
use serde::Serialize;
use std::collections::BTreeSet;
use x509_parser::error::X509Error;
use x509_parser::prelude::*;

/// A parsed PKCS#10 certificate signing request.
///
/// This is a read-only view: validators borrow it and never modify it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CertificateRequest {
    /// Subject distinguished name.
    pub subject: DistinguishedName,
    /// Extensions from the extensionRequest attribute, in encoded order.
    pub extensions: Vec<Extension>,

    /// Raw DER bytes of the entire request (for signature verification).
    #[serde(skip)]
    pub raw_der: Vec<u8>,
}

impl CertificateRequest {
    /// Build a request view from its parts. The view carries no DER, so
    /// its self-signature never verifies.
    pub fn new(subject: DistinguishedName, extensions: Vec<Extension>) -> Self {
        Self {
            subject,
            extensions,
            raw_der: Vec::new(),
        }
    }

    /// Subject attribute values of the given type, in subject order.
    pub fn subject_entries_by_oid<'a>(&'a self, oid: &'a str) -> impl Iterator<Item = &'a str> {
        self.subject.entries_by_oid(oid)
    }

    /// All extensions, in the order they were encoded.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Extensions of one kind, in encoded order.
    pub fn extensions_of_kind(&self, kind: ExtensionKind) -> impl Iterator<Item = &Extension> {
        self.extensions.iter().filter(move |ext| ext.kind() == kind)
    }

    /// Whether a subjectAltName extension is present (even an empty one).
    pub fn has_subject_alt_name(&self) -> bool {
        self.extensions_of_kind(ExtensionKind::SubjectAltName)
            .next()
            .is_some()
    }

    /// Verify the request's self-signature with its own public key.
    ///
    /// Returns `Ok(false)` when the signature does not match and an error
    /// when the request or its signature data cannot be decoded.
    pub fn verify_self_signature(&self) -> Result<bool, CsrgateError> {
        if self.raw_der.is_empty() {
            return Err(CsrgateError::DerError("request has no DER encoding".into()));
        }
        let (_, csr) = X509CertificationRequest::from_der(&self.raw_der)
            .map_err(|e| CsrgateError::DerError(format!("{}", e)))?;
        match csr.verify_signature() {
            Ok(()) => Ok(true),
            Err(X509Error::SignatureVerificationError) => Ok(false),
            Err(e) => Err(CsrgateError::ParseError(format!(
                "cannot verify request signature: {}",
                e
            ))),
        }
    }

    /// Return the subject as a one-line string.
    pub fn subject_string(&self) -> String {
        self.subject.to_oneline()
    }

    /// Extract all SAN entries across every subjectAltName extension.
    pub fn san_entries(&self) -> Vec<&SanEntry> {
        self.extensions
            .iter()
            .filter_map(|ext| match &ext.value {
                ExtensionValue::SubjectAltName(entries) => Some(entries.iter()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    /// Ordered list of (attribute OID, value) pairs.
    pub components: Vec<(String, String)>,
}

impl DistinguishedName {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, builder style.
    pub fn with(mut self, oid: &str, value: &str) -> Self {
        self.push(oid, value);
        self
    }

    pub fn push(&mut self, oid: &str, value: &str) {
        self.components.push((oid.to_string(), value.to_string()));
    }

    /// Values of every attribute with the given OID.
    pub fn entries_by_oid<'a>(&'a self, oid: &'a str) -> impl Iterator<Item = &'a str> {
        self.components
            .iter()
            .filter(move |(k, _)| k == oid)
            .map(|(_, v)| v.as_str())
    }

    /// Format as a comma-separated one-line string, e.g.
    /// "C = US, O = Org, CN = example.com".
    ///
    /// Values containing commas, equals signs, or backslashes are escaped
    /// to prevent ambiguous output.
    pub fn to_oneline(&self) -> String {
        let mut result = String::new();
        for (i, (k, v)) in self.components.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            result.push_str(oid::attribute_short_name(k).unwrap_or(k.as_str()));
            result.push_str(" = ");
            for ch in v.chars() {
                match ch {
                    '\\' => result.push_str("\\\\"),
                    ',' => result.push_str("\\,"),
                    '=' => result.push_str("\\="),
                    _ => result.push(ch),
                }
            }
        }
        result
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// A requested extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    /// OID as a dotted-decimal string.
    pub oid: String,
    /// Registered short name (e.g. "subjectAltName"), or the OID string if
    /// the extension is not registered.
    pub name: String,
    /// Whether this extension is marked critical.
    pub critical: bool,
    /// Parsed extension value.
    pub value: ExtensionValue,
}

impl Extension {
    /// Build an extension, deriving its short name from the OID.
    pub fn new(oid: &str, critical: bool, value: ExtensionValue) -> Self {
        Self {
            oid: oid.to_string(),
            name: oid::extension_short_name(oid)
                .map(str::to_string)
                .unwrap_or_else(|| oid.to_string()),
            critical,
            value,
        }
    }

    pub fn subject_alt_name(entries: Vec<SanEntry>) -> Self {
        Self::new(
            oid::EXT_SUBJECT_ALT_NAME,
            false,
            ExtensionValue::SubjectAltName(entries),
        )
    }

    pub fn basic_constraints(ca: bool) -> Self {
        Self::new(
            oid::EXT_BASIC_CONSTRAINTS,
            true,
            ExtensionValue::BasicConstraints { ca, path_len: None },
        )
    }

    pub fn key_usage(flags: impl IntoIterator<Item = KeyUsageFlag>) -> Self {
        Self::new(
            oid::EXT_KEY_USAGE,
            true,
            ExtensionValue::KeyUsage(flags.into_iter().collect()),
        )
    }

    pub fn ext_key_usage(oids: &[&str]) -> Self {
        Self::new(
            oid::EXT_EXTENDED_KEY_USAGE,
            false,
            ExtensionValue::ExtendedKeyUsage(oids.iter().map(|o| o.to_string()).collect()),
        )
    }

    /// An extension this crate does not interpret.
    pub fn other(oid: &str, raw_hex: &str) -> Self {
        Self::new(oid, false, ExtensionValue::Other(raw_hex.to_string()))
    }

    pub fn kind(&self) -> ExtensionKind {
        self.value.kind()
    }
}

/// Strongly-typed extension values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ExtensionValue {
    SubjectAltName(Vec<SanEntry>),
    BasicConstraints {
        ca: bool,
        path_len: Option<u32>,
    },
    KeyUsage(BTreeSet<KeyUsageFlag>),
    /// Usage OIDs as dotted-decimal strings.
    ExtendedKeyUsage(Vec<String>),
    /// Fallback for extensions the policy checks do not interpret (hex).
    Other(String),
}

impl ExtensionValue {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            ExtensionValue::SubjectAltName(_) => ExtensionKind::SubjectAltName,
            ExtensionValue::BasicConstraints { .. } => ExtensionKind::BasicConstraints,
            ExtensionValue::KeyUsage(_) => ExtensionKind::KeyUsage,
            ExtensionValue::ExtendedKeyUsage(_) => ExtensionKind::ExtendedKeyUsage,
            ExtensionValue::Other(_) => ExtensionKind::Other,
        }
    }
}

/// Discriminant of [`ExtensionValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    SubjectAltName,
    BasicConstraints,
    KeyUsage,
    ExtendedKeyUsage,
    Other,
}

/// Subject Alternative Name entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum SanEntry {
    Dns(String),
    Email(String),
    Ip(String),
    Uri(String),
    DirName(String),
    Other(String),
}

impl SanEntry {
    pub fn san_type(&self) -> SanType {
        match self {
            SanEntry::Dns(_) => SanType::Dns,
            SanEntry::Email(_) => SanType::Email,
            SanEntry::Ip(_) => SanType::Ip,
            SanEntry::Uri(_) => SanType::Uri,
            SanEntry::DirName(_) => SanType::DirName,
            SanEntry::Other(_) => SanType::Other,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            SanEntry::Dns(v)
            | SanEntry::Email(v)
            | SanEntry::Ip(v)
            | SanEntry::Uri(v)
            | SanEntry::DirName(v)
            | SanEntry::Other(v) => v,
        }
    }
}

/// Kind of a subjectAltName entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SanType {
    Dns,
    Email,
    Ip,
    Uri,
    DirName,
    Other,
}

impl std::fmt::Display for SanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SanType::Dns => "DNS",
            SanType::Email => "email",
            SanType::Ip => "IP Address",
            SanType::Uri => "URI",
            SanType::DirName => "DirName",
            SanType::Other => "othername",
        };
        f.write_str(name)
    }
}

/// RFC 5280 Section 4.2.1.3 key usage bits, in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsageFlag {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    #[serde(rename = "cRLSign")]
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl KeyUsageFlag {
    pub const ALL: [KeyUsageFlag; 9] = [
        KeyUsageFlag::DigitalSignature,
        KeyUsageFlag::NonRepudiation,
        KeyUsageFlag::KeyEncipherment,
        KeyUsageFlag::DataEncipherment,
        KeyUsageFlag::KeyAgreement,
        KeyUsageFlag::KeyCertSign,
        KeyUsageFlag::CrlSign,
        KeyUsageFlag::EncipherOnly,
        KeyUsageFlag::DecipherOnly,
    ];

    /// Canonical name, e.g. "digitalSignature".
    pub fn name(self) -> &'static str {
        match self {
            KeyUsageFlag::DigitalSignature => "digitalSignature",
            KeyUsageFlag::NonRepudiation => "nonRepudiation",
            KeyUsageFlag::KeyEncipherment => "keyEncipherment",
            KeyUsageFlag::DataEncipherment => "dataEncipherment",
            KeyUsageFlag::KeyAgreement => "keyAgreement",
            KeyUsageFlag::KeyCertSign => "keyCertSign",
            KeyUsageFlag::CrlSign => "cRLSign",
            KeyUsageFlag::EncipherOnly => "encipherOnly",
            KeyUsageFlag::DecipherOnly => "decipherOnly",
        }
    }

    /// Long display name, as `openssl req -text` prints it.
    pub fn long_name(self) -> &'static str {
        match self {
            KeyUsageFlag::DigitalSignature => "Digital Signature",
            KeyUsageFlag::NonRepudiation => "Non Repudiation",
            KeyUsageFlag::KeyEncipherment => "Key Encipherment",
            KeyUsageFlag::DataEncipherment => "Data Encipherment",
            KeyUsageFlag::KeyAgreement => "Key Agreement",
            KeyUsageFlag::KeyCertSign => "Certificate Sign",
            KeyUsageFlag::CrlSign => "CRL Sign",
            KeyUsageFlag::EncipherOnly => "Encipher Only",
            KeyUsageFlag::DecipherOnly => "Decipher Only",
        }
    }

    /// Look up a flag by canonical or long name.
    ///
    /// `contentCommitment` (the RFC 5280 name for bit 1) is accepted as an
    /// alias of `nonRepudiation`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "contentCommitment" {
            return Some(KeyUsageFlag::NonRepudiation);
        }
        Self::ALL
            .into_iter()
            .find(|flag| flag.name() == name || flag.long_name() == name)
    }
}

impl std::fmt::Display for KeyUsageFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
