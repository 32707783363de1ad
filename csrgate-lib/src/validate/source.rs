//! Restriction on where requests may come from.

use super::{ConfigError, PolicyViolation, ValidationContext, ValidationError, Validator};
use crate::check::IpNetwork;
use serde::{Deserialize, Serialize};

/// The client address must fall inside one of `cidrs`.
///
/// Networks are tried in order and the first match accepts. A malformed
/// network is reported when it is reached, so entries after a match are
/// never examined; [`Validator::preflight`] checks all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceCidrsCheck {
    pub cidrs: Vec<String>,
}

impl Validator for SourceCidrsCheck {
    fn name(&self) -> &'static str {
        "source_cidrs"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let request = ctx
            .request
            .ok_or(ConfigError::MissingRequestMetadata { check: self.name() })?;
        let client = request.client_address;

        for cidr in &self.cidrs {
            let network: IpNetwork = cidr.parse()?;
            if network.contains(&client) {
                return Ok(());
            }
        }

        Err(PolicyViolation::SourceNotAllowed {
            address: client.to_string(),
        }
        .into())
    }

    fn preflight(&self) -> Result<(), ConfigError> {
        for cidr in &self.cidrs {
            cidr.parse::<IpNetwork>()?;
        }
        Ok(())
    }
}
