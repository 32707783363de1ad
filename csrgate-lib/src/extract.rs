//! Extraction helpers for subject names and alternative names.

use crate::fields::{CertificateRequest, ExtensionValue, SanEntry, SanType};
use crate::oid;
use crate::validate::PolicyViolation;

/// Return the request's single Common Name.
///
/// A request with several CN entries is ambiguous and always rejected.
/// Callers that tolerate a missing CN must check for one before calling.
pub fn require_single_cn(csr: &CertificateRequest) -> Result<&str, PolicyViolation> {
    let mut cns = csr.subject_entries_by_oid(oid::COMMON_NAME);
    match (cns.next(), cns.next()) {
        (Some(cn), None) => Ok(cn),
        (Some(_), Some(_)) => Err(PolicyViolation::TooManyCommonNames),
        (None, _) => Err(PolicyViolation::NoCommonName),
    }
}

/// Number of Common Name entries in the subject.
pub(crate) fn count_cn(csr: &CertificateRequest) -> usize {
    csr.subject_entries_by_oid(oid::COMMON_NAME).count()
}

/// Iterate over subjectAltName entries of the `wanted` types.
///
/// Entries from every subjectAltName extension are visited in encoded
/// order; a request without the extension yields nothing. When
/// `fail_on_other` is set, the first entry of an unrequested type yields
/// [`PolicyViolation::UnexpectedAltNameType`], otherwise such entries are
/// skipped. Each call starts a fresh pass over the request.
pub fn alternative_names<'a>(
    csr: &'a CertificateRequest,
    wanted: &'a [SanType],
    fail_on_other: bool,
) -> impl Iterator<Item = Result<&'a SanEntry, PolicyViolation>> + 'a {
    csr.extensions()
        .iter()
        .filter_map(|ext| match &ext.value {
            ExtensionValue::SubjectAltName(entries) => Some(entries.iter()),
            _ => None,
        })
        .flatten()
        .filter_map(move |entry| {
            let san_type = entry.san_type();
            if wanted.contains(&san_type) {
                Some(Ok(entry))
            } else if fail_on_other {
                Some(Err(PolicyViolation::UnexpectedAltNameType {
                    san_type,
                    value: entry.value().to_string(),
                }))
            } else {
                None
            }
        })
}
