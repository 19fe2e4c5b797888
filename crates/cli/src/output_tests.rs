// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use oms_capture::CaptureType;

fn summary() -> PerformanceSummary {
    PerformanceSummary {
        total_calls: 3,
        resolved_calls: 2,
        pending_calls: 1,
        average_response_time: 20.0,
        min_response_time: Some(10),
        max_response_time: Some(30),
        success_count: 1,
        failure_count: 1,
    }
}

fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
    let mut buf = Vec::new();
    f(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_summary_text() {
    let raw = RawCallFile::new("uat", CaptureType::Body, "2026-01-01T00:00:00.000Z".into());
    let text = render(|w| write_summary(w, &raw, &summary(), OutputFormat::Text));
    assert!(text.contains("environment:   uat"));
    assert!(text.contains("capture type:  body"));
    assert!(text.contains("status:        running"));
    assert!(text.contains("calls:         3 (2 resolved, 1 pending)"));
    assert!(text.contains("average:       20.0ms"));
    assert!(text.contains("range:         10ms - 30ms"));
    assert!(text.contains("outcomes:      1 ok, 1 failed"));
}

#[test]
fn test_summary_text_without_resolved_calls_omits_range() {
    let raw = RawCallFile::new("uat", CaptureType::Url, "2026-01-01T00:00:00.000Z".into());
    let text = render(|w| write_summary(w, &raw, &PerformanceSummary::default(), OutputFormat::Text));
    assert!(text.contains("average:       0.0ms"));
    assert!(!text.contains("range:"));
}

#[test]
fn test_summary_json() {
    let mut raw = RawCallFile::new("uat", CaptureType::Url, "2026-01-01T00:00:00.000Z".into());
    raw.metadata.status = RunStatus::Completed;
    let text = render(|w| write_summary(w, &raw, &summary(), OutputFormat::Json));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["environment"], "uat");
    assert_eq!(value["captureType"], "url");
    assert_eq!(value["status"], "completed");
    assert_eq!(value["performance"]["averageResponseTime"], 20.0);
}

#[test]
fn test_domains_listing() {
    let origins = vec![
        "https://uat-oms.example.com".to_string(),
        "https://uat-auth.example.com".to_string(),
    ];
    let text = render(|w| write_domains(w, "uat", &origins));
    assert_eq!(
        text,
        "uat:\n  https://uat-oms.example.com\n  https://uat-auth.example.com\n"
    );
}

#[test]
fn test_write_error_plain() {
    let mut buf = Vec::new();
    write_error(&mut buf, "no domains configured", false);
    assert_eq!(String::from_utf8(buf).unwrap(), "Error: no domains configured\n");
}

#[test]
fn test_write_error_terminal_is_red() {
    let mut buf = Vec::new();
    write_error(&mut buf, "boom", true);
    assert_eq!(String::from_utf8(buf).unwrap(), "\x1b[31mError: boom\x1b[0m\n");
}
