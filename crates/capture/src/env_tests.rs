// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn environment_returns_none_when_unset() {
    std::env::remove_var(OMS_ENV);
    assert_eq!(environment(), None);
}

#[test]
#[serial]
fn environment_ignores_blank_value() {
    std::env::set_var(OMS_ENV, "  ");
    let result = environment();
    std::env::remove_var(OMS_ENV);
    assert_eq!(result, None);
}

#[test]
#[serial]
fn capture_dir_returns_path_when_set() {
    std::env::set_var(OMS_CAPTURE_DIR, "/tmp/oms-capture");
    let result = capture_dir();
    std::env::remove_var(OMS_CAPTURE_DIR);
    assert_eq!(result, Some(PathBuf::from("/tmp/oms-capture")));
}

#[test]
#[serial]
fn debounce_parses_valid_u64() {
    std::env::set_var(OMS_CAPTURE_DEBOUNCE_MS, "250");
    let result = debounce_ms();
    std::env::remove_var(OMS_CAPTURE_DEBOUNCE_MS);
    assert_eq!(result, Some(250));
}

#[test]
#[serial]
fn debounce_rejects_garbage() {
    std::env::set_var(OMS_CAPTURE_DEBOUNCE_MS, "soon");
    let result = debounce_ms();
    std::env::remove_var(OMS_CAPTURE_DEBOUNCE_MS);
    assert_eq!(result, None);
}

#[test]
#[serial]
fn max_response_bytes_parses_usize() {
    std::env::set_var(OMS_MAX_RESPONSE_BYTES, "1024");
    let result = max_response_bytes();
    std::env::remove_var(OMS_MAX_RESPONSE_BYTES);
    assert_eq!(result, Some(1024));
}

#[test]
fn domains_var_uppercases_and_sanitizes() {
    assert_eq!(domains_var("uat"), "OMS_UAT_DOMAINS");
    assert_eq!(domains_var("pre-prod"), "OMS_PRE_PROD_DOMAINS");
}

#[test]
#[serial]
fn domains_splits_and_trims() {
    std::env::set_var(
        "OMS_QA_DOMAINS",
        "https://qa-oms.example.com, https://qa-auth.example.com:8443,,",
    );
    let result = domains("qa");
    std::env::remove_var("OMS_QA_DOMAINS");
    assert_eq!(
        result,
        Some(vec![
            "https://qa-oms.example.com".to_string(),
            "https://qa-auth.example.com:8443".to_string(),
        ])
    );
}
