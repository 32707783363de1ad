//! Admission checks for certificate signing requests.
//!
//! Each check is an immutable configuration struct implementing
//! [`Validator`]. A check borrows the parsed request through a
//! [`ValidationContext`], together with the optional authentication result
//! and request metadata supplied by the caller, and either accepts the
//! request or returns a [`ValidationError`].
//!
//! Checks hold no state between calls, so one configuration may be shared
//! by any number of concurrent validations.

mod error;
mod extensions;
mod names;
mod policy;
mod signature;
mod sink;
mod source;
pub mod usage;

use crate::fields::CertificateRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;

pub use error::{ConfigError, NameLocation, PolicyViolation, ValidationError};
pub use extensions::{CaStatusCheck, ExtKeyUsageCheck, ExtensionsCheck, KeyUsageCheck};
pub use names::{
    AlternativeNamesCheck, AlternativeNamesIpCheck, BlacklistNamesCheck, CommonNameCheck,
    ServerGroupCheck,
};
pub use policy::{AdmissionPolicy, AdmissionResult, CheckConfig, CheckFailure, EvaluationMode, FailureKind};
pub use signature::CsrSignatureCheck;
pub use sink::{RecordingSink, TracingSink, WarningSink};
pub use source::SourceCidrsCheck;

/// A single admission check.
pub trait Validator: Send + Sync {
    /// Stable name of the check (e.g. "common_name").
    fn name(&self) -> &'static str;

    /// Accept or reject the request in `ctx`.
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError>;

    /// Validate the configuration alone, without a request.
    ///
    /// Reports problems that would otherwise surface only when a request
    /// reaches the faulty entry.
    fn preflight(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Group memberships of the authenticated requester.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub groups: BTreeSet<String>,
}

impl AuthResult {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_member(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}

/// Transport-level facts about the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub client_address: IpAddr,
}

impl RequestMetadata {
    pub fn new(client_address: IpAddr) -> Self {
        Self { client_address }
    }
}

static DEFAULT_SINK: TracingSink = TracingSink;

/// Everything a check may look at for one request.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub csr: &'a CertificateRequest,
    pub auth: Option<&'a AuthResult>,
    pub request: Option<&'a RequestMetadata>,
    pub sink: &'a dyn WarningSink,
}

impl<'a> ValidationContext<'a> {
    /// A context with no auth result or metadata, warning through `tracing`.
    pub fn new(csr: &'a CertificateRequest) -> Self {
        Self {
            csr,
            auth: None,
            request: None,
            sink: &DEFAULT_SINK,
        }
    }

    pub fn with_auth(mut self, auth: &'a AuthResult) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_request(mut self, request: &'a RequestMetadata) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_sink(mut self, sink: &'a dyn WarningSink) -> Self {
        self.sink = sink;
        self
    }
}

impl std::fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationContext")
            .field("subject", &self.csr.subject_string())
            .field("auth", &self.auth)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
