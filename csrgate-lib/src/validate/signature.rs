use super::{PolicyViolation, ValidationContext, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// The request must carry a valid self-signature.
///
/// A mismatching signature and undecodable signature data are reported
/// identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsrSignatureCheck {}

impl Validator for CsrSignatureCheck {
    fn name(&self) -> &'static str {
        "csr_signature"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        match ctx.csr.verify_self_signature() {
            Ok(true) => Ok(()),
            Ok(false) => Err(PolicyViolation::InvalidSignature.into()),
            Err(e) => {
                tracing::debug!(error = %e, "request signature could not be checked");
                Err(PolicyViolation::InvalidSignature.into())
            }
        }
    }
}
