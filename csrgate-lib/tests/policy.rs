#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Tests for loading admission policies and evaluating them.

use csrgate_lib::oid;
use csrgate_lib::validate::{CommonNameCheck, KeyUsageCheck, RecordingSink};
use csrgate_lib::{
    AdmissionPolicy, CertificateRequest, CheckConfig, CsrgateError, DistinguishedName,
    EvaluationMode, Extension, FailureKind, KeyUsageFlag, PolicyViolation, ValidationContext,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const POLICY: &str = r#"{
  "mode": "fail_fast",
  "checks": [
    {"check": "common_name", "allowed_domains": ["example.com"]},
    {"check": "key_usage", "allowed_usage": ["digitalSignature"]},
    {"check": "ca_status"}
  ]
}"#;

fn request(cn: &str, extensions: Vec<Extension>) -> CertificateRequest {
    CertificateRequest::new(
        DistinguishedName::new().with(oid::COMMON_NAME, cn),
        extensions,
    )
}

/// A request that breaks all three checks of [`POLICY`].
fn bad_request() -> CertificateRequest {
    request(
        "www.example.net",
        vec![Extension::key_usage([
            KeyUsageFlag::DigitalSignature,
            KeyUsageFlag::KeyCertSign,
        ])],
    )
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn load_policy_from_json() {
    let policy = AdmissionPolicy::from_json(POLICY).unwrap();
    assert_eq!(policy.mode, EvaluationMode::FailFast);
    assert_eq!(policy.checks.len(), 3);
    assert_eq!(
        policy.checks[0],
        CheckConfig::CommonName(CommonNameCheck {
            allowed_domains: vec!["example.com".to_string()],
            allowed_networks: vec![],
        })
    );
    let names: Vec<&str> = policy.validators().map(|v| v.name()).collect();
    assert_eq!(names, ["common_name", "key_usage", "ca_status"]);
}

#[test]
fn load_policy_defaults() {
    let policy = AdmissionPolicy::from_json("{}").unwrap();
    assert_eq!(policy, AdmissionPolicy::default());
    assert_eq!(policy.mode, EvaluationMode::FailFast);
    assert!(policy.checks.is_empty());

    let policy = AdmissionPolicy::from_json(r#"{"checks": [{"check": "csr_signature"}]}"#).unwrap();
    assert_eq!(policy.validators().next().unwrap().name(), "csr_signature");
}

#[test]
fn load_policy_every_check_name() {
    let json = r#"{"mode": "collect_all", "checks": [
        {"check": "common_name"},
        {"check": "alternative_names"},
        {"check": "alternative_names_ip"},
        {"check": "blacklist_names"},
        {"check": "server_group", "group_prefixes": {"nv": "nova"}},
        {"check": "extensions"},
        {"check": "key_usage"},
        {"check": "ext_key_usage"},
        {"check": "ca_status", "ca_requested": true},
        {"check": "source_cidrs", "cidrs": ["10.0.0.0/8"]},
        {"check": "csr_signature"}
    ]}"#;
    let policy = AdmissionPolicy::from_json(json).unwrap();
    assert_eq!(policy.mode, EvaluationMode::CollectAll);
    let names: Vec<&str> = policy.validators().map(|v| v.name()).collect();
    assert_eq!(
        names,
        [
            "common_name",
            "alternative_names",
            "alternative_names_ip",
            "blacklist_names",
            "server_group",
            "extensions",
            "key_usage",
            "ext_key_usage",
            "ca_status",
            "source_cidrs",
            "csr_signature",
        ]
    );
}

#[test]
fn load_policy_rejects_unknown_keys() {
    let typo = r#"{"checks": [{"check": "common_name", "allowed_domain": ["example.com"]}]}"#;
    assert!(matches!(
        AdmissionPolicy::from_json(typo),
        Err(CsrgateError::Json(_))
    ));

    let unknown_check = r#"{"checks": [{"check": "common_names"}]}"#;
    assert!(AdmissionPolicy::from_json(unknown_check).is_err());

    let unknown_top = r#"{"checks": [], "strict": true}"#;
    assert!(AdmissionPolicy::from_json(unknown_top).is_err());
}

#[test]
fn load_policy_from_file() {
    let path = std::env::temp_dir().join("csrgate_test_policy.json");
    std::fs::write(&path, POLICY).unwrap();
    let policy = AdmissionPolicy::from_file(&path).unwrap();
    assert_eq!(policy.checks.len(), 3);
    let _ = std::fs::remove_file(&path);

    let missing = std::env::temp_dir().join("csrgate_test_policy_missing.json");
    assert!(matches!(
        AdmissionPolicy::from_file(&missing),
        Err(CsrgateError::Io(_))
    ));
}

#[test]
fn policy_round_trips_through_json() {
    let policy = AdmissionPolicy::from_json(POLICY).unwrap();
    let json = serde_json::to_string(&policy).unwrap();
    assert_eq!(AdmissionPolicy::from_json(&json).unwrap(), policy);
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[test]
fn evaluate_accepts_good_request() {
    let policy = AdmissionPolicy::from_json(POLICY).unwrap();
    let csr = request(
        "www.example.com",
        vec![Extension::key_usage([KeyUsageFlag::DigitalSignature])],
    );
    let result = policy.evaluate(&ValidationContext::new(&csr));
    assert!(result.accepted);
    assert!(result.failures.is_empty());
    assert_eq!(result.to_string(), "OK");
}

#[test]
fn evaluate_fail_fast_stops_at_first_failure() {
    let policy = AdmissionPolicy::from_json(POLICY).unwrap();
    let csr = bad_request();
    let result = policy.evaluate(&ValidationContext::new(&csr));
    assert!(!result.accepted);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].check, "common_name");
    assert_eq!(result.failures[0].kind, FailureKind::Policy);
    assert_eq!(
        result.to_string(),
        "FAIL, common_name: Domain 'www.example.net' not allowed (does not match known domains)"
    );
}

#[test]
fn evaluate_collect_all_reports_every_failure() {
    let mut policy = AdmissionPolicy::from_json(POLICY).unwrap();
    policy.mode = EvaluationMode::CollectAll;
    let csr = bad_request();
    let result = policy.evaluate(&ValidationContext::new(&csr));
    assert!(!result.accepted);
    let checks: Vec<&str> = result.failures.iter().map(|f| f.check).collect();
    assert_eq!(checks, ["common_name", "key_usage", "ca_status"]);
    assert_eq!(
        result.failures[1].error.policy(),
        Some(&PolicyViolation::KeyUsageNotAllowed {
            denied: vec!["keyCertSign".to_string()]
        })
    );
    assert!(!result.has_config_errors());
}

#[test]
fn evaluate_marks_config_errors() {
    let policy = AdmissionPolicy::new(
        EvaluationMode::CollectAll,
        vec![CheckConfig::KeyUsage(KeyUsageCheck {
            allowed_usage: vec!["sign everything".to_string()],
        })],
    );
    let csr = request("www.example.com", vec![]);
    let result = policy.evaluate(&ValidationContext::new(&csr));
    assert!(!result.accepted);
    assert!(result.has_config_errors());
    assert_eq!(result.failures[0].kind, FailureKind::Config);
    assert_eq!(result.failures[0].message, "Unknown usage: sign everything");
}

#[test]
fn evaluate_empty_policy_accepts_and_warns() {
    let policy = AdmissionPolicy::default();
    let sink = RecordingSink::new();
    let csr = request("anything", vec![]);
    let result = policy.evaluate(&ValidationContext::new(&csr).with_sink(&sink));
    assert!(result.accepted);
    let warnings = sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, "admission_policy");
}

#[test]
fn evaluate_result_serializes_to_json() {
    let policy = AdmissionPolicy::from_json(POLICY).unwrap();
    let csr = bad_request();
    let result = policy.evaluate(&ValidationContext::new(&csr));
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["accepted"], false);
    assert_eq!(value["failures"][0]["check"], "common_name");
    assert_eq!(value["failures"][0]["kind"], "policy");
}

// ---------------------------------------------------------------------------
// Preflight
// ---------------------------------------------------------------------------

#[test]
fn preflight_finds_every_broken_entry() {
    let json = r#"{"checks": [
        {"check": "common_name", "allowed_networks": ["10.0.0.0/8", "10.0.0.0/99"]},
        {"check": "key_usage", "allowed_usage": ["digitalSignature"]},
        {"check": "ext_key_usage", "allowed_usage": ["serverAuth", "bogus"]},
        {"check": "source_cidrs", "cidrs": ["10.0.0.0/8", "nope"]}
    ]}"#;
    let policy = AdmissionPolicy::from_json(json).unwrap();
    let problems = policy.preflight();
    let checks: Vec<&str> = problems.iter().map(|p| p.check).collect();
    assert_eq!(checks, ["common_name", "ext_key_usage", "source_cidrs"]);
    assert!(problems.iter().all(|p| p.kind == FailureKind::Config));
    assert_eq!(
        problems[2].to_string(),
        "source_cidrs: Cidr 'nope' does not describe a valid network"
    );
}

#[test]
fn preflight_clean_policy() {
    let policy = AdmissionPolicy::from_json(POLICY).unwrap();
    assert!(policy.preflight().is_empty());
}
