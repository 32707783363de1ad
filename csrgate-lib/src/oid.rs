//! Dotted-decimal OIDs for subject attributes, requestable extensions and
//! extended key usages, with the short names policies refer to them by.

// ── X.509 Distinguished Name attributes (RFC 4519 / X.520) ──────────────

pub const COMMON_NAME: &str = "2.5.4.3";
pub const SURNAME: &str = "2.5.4.4";
pub const SERIAL_NUMBER: &str = "2.5.4.5";
pub const COUNTRY: &str = "2.5.4.6";
pub const LOCALITY: &str = "2.5.4.7";
pub const STATE_OR_PROVINCE: &str = "2.5.4.8";
pub const STREET_ADDRESS: &str = "2.5.4.9";
pub const ORGANIZATION: &str = "2.5.4.10";
pub const ORGANIZATIONAL_UNIT: &str = "2.5.4.11";
pub const TITLE: &str = "2.5.4.12";
pub const POSTAL_CODE: &str = "2.5.4.17";
pub const GIVEN_NAME: &str = "2.5.4.42";
pub const EMAIL_ADDRESS: &str = "1.2.840.113549.1.9.1"; // PKCS#9
pub const DOMAIN_COMPONENT: &str = "0.9.2342.19200300.100.1.25";

// ── X.509v3 extensions (RFC 5280 Section 4.2) ───────────────────────────

pub const EXT_SUBJECT_KEY_ID: &str = "2.5.29.14";
pub const EXT_KEY_USAGE: &str = "2.5.29.15";
pub const EXT_SUBJECT_ALT_NAME: &str = "2.5.29.17";
pub const EXT_ISSUER_ALT_NAME: &str = "2.5.29.18";
pub const EXT_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXT_NAME_CONSTRAINTS: &str = "2.5.29.30";
pub const EXT_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const EXT_CERTIFICATE_POLICIES: &str = "2.5.29.32";
pub const EXT_POLICY_MAPPINGS: &str = "2.5.29.33";
pub const EXT_AUTHORITY_KEY_ID: &str = "2.5.29.35";
pub const EXT_POLICY_CONSTRAINTS: &str = "2.5.29.36";
pub const EXT_EXTENDED_KEY_USAGE: &str = "2.5.29.37";
pub const EXT_FRESHEST_CRL: &str = "2.5.29.46";
pub const EXT_INHIBIT_ANY_POLICY: &str = "2.5.29.54";

// ── PKIX Authority/Subject Information Access (RFC 5280 Section 4.2.2) ──

pub const EXT_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";
pub const EXT_SUBJECT_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.11";
pub const EXT_TLS_FEATURE: &str = "1.3.6.1.5.5.7.1.12";

// ── Extended Key Usage values (RFC 5280 Section 4.2.1.12) ────────────────

pub const EKU_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
pub const EKU_CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
pub const EKU_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
pub const EKU_EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";
pub const EKU_TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
pub const EKU_OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";
pub const EKU_ANY: &str = "2.5.29.37.0";
pub const EKU_IPSEC_END_SYSTEM: &str = "1.3.6.1.5.5.7.3.5";
pub const EKU_IPSEC_TUNNEL: &str = "1.3.6.1.5.5.7.3.6";
pub const EKU_IPSEC_USER: &str = "1.3.6.1.5.5.7.3.7";
pub const EKU_MS_SERVER_GATED_CRYPTO: &str = "1.3.6.1.4.1.311.10.3.3";
pub const EKU_NS_SERVER_GATED_CRYPTO: &str = "2.16.840.1.113730.4.1";

// ── Netscape extensions (legacy) ─────────────────────────────────────────

pub const EXT_NETSCAPE_CERT_TYPE: &str = "2.16.840.1.113730.1.1";
pub const EXT_NETSCAPE_COMMENT: &str = "2.16.840.1.113730.1.13";

/// Registered short name of an extension, as OpenSSL spells it.
///
/// Unregistered extensions have no short name; callers fall back to the
/// dotted OID.
pub fn extension_short_name(oid_str: &str) -> Option<&'static str> {
    let name = match oid_str {
        EXT_SUBJECT_KEY_ID => "subjectKeyIdentifier",
        EXT_KEY_USAGE => "keyUsage",
        EXT_SUBJECT_ALT_NAME => "subjectAltName",
        EXT_ISSUER_ALT_NAME => "issuerAltName",
        EXT_BASIC_CONSTRAINTS => "basicConstraints",
        EXT_NAME_CONSTRAINTS => "nameConstraints",
        EXT_CRL_DISTRIBUTION_POINTS => "crlDistributionPoints",
        EXT_CERTIFICATE_POLICIES => "certificatePolicies",
        EXT_POLICY_MAPPINGS => "policyMappings",
        EXT_AUTHORITY_KEY_ID => "authorityKeyIdentifier",
        EXT_POLICY_CONSTRAINTS => "policyConstraints",
        EXT_EXTENDED_KEY_USAGE => "extendedKeyUsage",
        EXT_FRESHEST_CRL => "freshestCRL",
        EXT_INHIBIT_ANY_POLICY => "inhibitAnyPolicy",
        EXT_AUTHORITY_INFO_ACCESS => "authorityInfoAccess",
        EXT_SUBJECT_INFO_ACCESS => "subjectInfoAccess",
        EXT_TLS_FEATURE => "tlsfeature",
        EXT_NETSCAPE_CERT_TYPE => "nsCertType",
        EXT_NETSCAPE_COMMENT => "nsComment",
        _ => return None,
    };
    Some(name)
}

/// Short name of a distinguished name attribute (e.g. "CN", "O").
pub fn attribute_short_name(oid_str: &str) -> Option<&'static str> {
    let name = match oid_str {
        COMMON_NAME => "CN",
        SURNAME => "SN",
        SERIAL_NUMBER => "serialNumber",
        COUNTRY => "C",
        LOCALITY => "L",
        STATE_OR_PROVINCE => "ST",
        STREET_ADDRESS => "street",
        ORGANIZATION => "O",
        ORGANIZATIONAL_UNIT => "OU",
        TITLE => "title",
        POSTAL_CODE => "postalCode",
        GIVEN_NAME => "GN",
        EMAIL_ADDRESS => "emailAddress",
        DOMAIN_COMPONENT => "DC",
        _ => return None,
    };
    Some(name)
}
