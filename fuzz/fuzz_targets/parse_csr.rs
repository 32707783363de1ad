#![no_main]

use csrgate_lib::{
    parse_csr, AdmissionPolicy, AuthResult, EvaluationMode, RequestMetadata, ValidationContext,
};
use libfuzzer_sys::fuzz_target;
use std::net::{IpAddr, Ipv4Addr};

const POLICY: &str = r#"{
  "checks": [
    {"check": "common_name", "allowed_domains": ["example.com"], "allowed_networks": ["10.0.0.0/8", "::/0"]},
    {"check": "alternative_names", "allowed_domains": [".example.com"]},
    {"check": "alternative_names_ip", "allowed_domains": ["example.com"], "allowed_networks": ["0.0.0.0/0"], "reject_other_types": true},
    {"check": "blacklist_names", "domains": ["bad.example.com"]},
    {"check": "server_group", "group_prefixes": {"nv": "nova"}},
    {"check": "extensions", "allowed_extensions": ["subjectAltName", "2.5.29.15"]},
    {"check": "key_usage", "allowed_usage": ["digitalSignature", "Key Encipherment"]},
    {"check": "ext_key_usage", "allowed_usage": ["serverAuth", "1.3.6.1.5.5.7.3.2"]},
    {"check": "ca_status", "ca_requested": false},
    {"check": "source_cidrs", "cidrs": ["127.0.0.0/8"]},
    {"check": "csr_signature"}
  ]
}"#;

fuzz_target!(|data: &[u8]| {
    // Parsing and every check must never panic, regardless of input.
    let Ok(csr) = parse_csr(data) else {
        return;
    };

    let _ = csrgate_lib::display_text(&csr);
    let _ = csrgate_lib::to_json(&csr);
    let _ = csr.subject_string();
    let _ = csr.san_entries();

    let Ok(mut policy) = AdmissionPolicy::from_json(POLICY) else {
        return;
    };
    policy.mode = EvaluationMode::CollectAll;

    let auth = AuthResult::new(["nova"]);
    let request = RequestMetadata::new(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let _ = policy.evaluate(&ValidationContext::new(&csr));
    let ctx = ValidationContext::new(&csr)
        .with_auth(&auth)
        .with_request(&request);
    let _ = policy.evaluate(&ctx).to_string();
});
