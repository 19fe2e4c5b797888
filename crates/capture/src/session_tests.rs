// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use crate::error::ConfigError;
use crate::postman::PostmanCollection;
use crate::store::read_json;
use crate::time::FakeClock;
use std::time::Duration;
use tempfile::TempDir;

const BASE: &str = "https://uat-oms.example.com";

fn config(dir: &TempDir) -> CaptureConfig {
    let mut config = CaptureConfig::default()
        .with_environment("uat")
        .with_domains("uat", [BASE])
        .with_output_dir(dir.path());
    config.debounce_ms = 60_000;
    config
}

async fn session_with(config: CaptureConfig, capture_type: CaptureType) -> (CaptureSession, FakeClock) {
    let clock = FakeClock::new(1_000_000);
    let session = CaptureSession::builder(config, capture_type)
        .clock(ClockHandle::Fake(clock.clone()))
        .start()
        .await
        .unwrap();
    (session, clock)
}

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

#[tokio::test]
async fn test_start_writes_running_files() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    let raw = RawCallFile::read(session.raw_path()).await.unwrap();
    assert_eq!(raw.metadata.status, RunStatus::Running);
    assert_eq!(raw.metadata.total_calls, 0);
    assert_eq!(raw.metadata.start_time, "1970-01-01T00:16:40.000Z");
    assert!(raw.api_calls.is_empty());

    let collection: PostmanCollection = read_json(session.postman_path()).await.unwrap();
    assert_eq!(collection.info.name, "OMS API Collection - UAT (url)");
    assert!(collection.item.is_empty());
    assert!(session
        .postman_path()
        .ends_with("oms_postman_collection_url_UAT.json"));
}

#[tokio::test]
async fn test_start_without_domains_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = CaptureConfig::default()
        .with_environment("prod")
        .with_output_dir(dir.path());

    let err = CaptureSession::start(config, CaptureType::Url)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, CaptureError::Config(ConfigError::NoDomains(env)) if env == "prod"));
}

#[tokio::test]
async fn test_unanswered_requests_stream_then_finalize() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.debounce_ms = 20;
    let (session, _clock) = session_with(cfg, CaptureType::Url).await;

    for i in 0..12 {
        assert_eq!(session.on_request(RequestEvent::new("GET", url(&format!("/api/{i}")))), Some(i));
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    let raw = RawCallFile::read(session.raw_path()).await.unwrap();
    assert_eq!(raw.metadata.total_calls, 12);
    assert_eq!(raw.metadata.status, RunStatus::Running);

    let report = session.finalize().await.unwrap();
    assert_eq!(report.total_calls, 12);
    assert_eq!(report.performance.average_response_time, 0.0);

    let raw = RawCallFile::read(session.raw_path()).await.unwrap();
    assert_eq!(raw.metadata.status, RunStatus::Completed);
    assert_eq!(raw.metadata.total_calls, 12);
    assert!(raw.metadata.end_time.is_some());

    let collection: PostmanCollection = read_json(session.postman_path()).await.unwrap();
    assert_eq!(collection.item.len(), 12);
    assert!(collection.item.iter().all(|i| i.response.is_empty()));
}

#[tokio::test]
async fn test_responses_resolve_oldest_pending_call_first() {
    let dir = tempfile::tempdir().unwrap();
    let (session, clock) = session_with(config(&dir), CaptureType::Url).await;
    let book = url("/api/orderbook");

    session.on_request(RequestEvent::new("GET", &book));
    clock.advance_ms(10);
    session.on_request(RequestEvent::new("GET", &book));

    clock.advance_ms(40);
    assert!(session.on_response(ResponseEvent::new(&book, 200)));
    clock.advance_ms(20);
    assert!(session.on_response(ResponseEvent::new(&book, 500)));

    let calls = session.calls();
    assert_eq!(calls[0].response_time, Some(50));
    assert_eq!(calls[0].status_code, Some(200));
    assert_eq!(calls[1].response_time, Some(60));
    assert_eq!(calls[1].status_code, Some(500));

    // both resolved; a third response has nothing to attach to
    assert!(!session.on_response(ResponseEvent::new(&book, 200)));
}

#[tokio::test]
async fn test_response_without_request_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    assert!(!session.on_response(ResponseEvent::new(url("/api/ghost"), 200)));
    assert!(session.is_empty());
    assert_eq!(session.writer().pending_len(), 0);
}

#[tokio::test]
async fn test_requests_outside_domains_are_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    assert_eq!(session.on_request(RequestEvent::new("GET", "https://cdn.example.com/app.js")), None);
    assert_eq!(session.on_request(RequestEvent::new("GET", "http://uat-oms.example.com/api")), None);
    assert_eq!(session.len(), 0);
    assert_eq!(session.metrics().total_calls, 0);
}

#[tokio::test]
async fn test_body_session_uses_configured_commands() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.commands = vec!["NewOrder".to_string()];
    let (session, _clock) = session_with(cfg, CaptureType::Body).await;
    let api = url("/api");

    let new_order = RequestEvent::new("POST", &api).with_body(r#"{"cmd":"NewOrder","qty":1}"#);
    let cancel = RequestEvent::new("POST", &api).with_body(r#"{"cmd":"CancelOrder"}"#);
    assert_eq!(session.on_request(new_order), Some(0));
    assert_eq!(session.on_request(cancel), None);
    assert_eq!(session.on_request(RequestEvent::new("GET", &api)), None);
    assert_eq!(session.len(), 1);
    assert!(session.raw_path().ends_with("api_calls_body.json"));
}

#[tokio::test]
async fn test_body_session_defaults_to_oms_commands() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Body).await;
    let api = url("/api");

    let cancel = RequestEvent::new("POST", &api).with_body(r#"{"cmd":"CancelOrder"}"#);
    let unknown = RequestEvent::new("POST", &api).with_body(r#"{"cmd":"Heartbeat"}"#);
    assert_eq!(session.on_request(cancel), Some(0));
    assert_eq!(session.on_request(unknown), None);
}

#[tokio::test]
async fn test_custom_filter_and_no_filter() {
    let dir = tempfile::tempdir().unwrap();
    let session = CaptureSession::builder(config(&dir), CaptureType::Url)
        .filter(|url: &str, _body: Option<&str>| url.ends_with("/orders"))
        .start()
        .await
        .unwrap();
    assert_eq!(session.on_request(RequestEvent::new("GET", url("/orders"))), Some(0));
    assert_eq!(session.on_request(RequestEvent::new("GET", url("/limits"))), None);

    let dir = tempfile::tempdir().unwrap();
    let session = CaptureSession::builder(config(&dir), CaptureType::Body)
        .no_filter()
        .start()
        .await
        .unwrap();
    assert_eq!(session.on_request(RequestEvent::new("GET", url("/limits"))), Some(0));
}

#[tokio::test]
async fn test_response_bodies_are_stored_as_json_or_text() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    session.on_request(RequestEvent::new("GET", url("/json")));
    session.on_request(RequestEvent::new("GET", url("/text")));
    session.on_response(ResponseEvent::new(url("/json"), 200).with_body(r#"{"ok":true}"#));
    session.on_response(ResponseEvent::new(url("/text"), 200).with_body("pong"));

    let calls = session.calls();
    assert_eq!(calls[0].response_data, Some(serde_json::json!({"ok": true})));
    assert_eq!(calls[1].response_data, Some(serde_json::json!("pong")));
}

#[tokio::test]
async fn test_large_response_body_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.max_response_bytes = 10;
    let (session, _clock) = session_with(cfg, CaptureType::Url).await;

    session.on_request(RequestEvent::new("GET", url("/big")));
    session.on_response(ResponseEvent::new(url("/big"), 200).with_body("x".repeat(25)));

    let data = session.calls()[0].response_data.clone().unwrap();
    assert_eq!(
        data.as_str().unwrap(),
        "xxxxxxxxxx... [TRUNCATED - original size: 25 bytes]"
    );
}

#[tokio::test]
async fn test_response_bodies_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.capture_response_bodies = false;
    let (session, _clock) = session_with(cfg, CaptureType::Url).await;

    session.on_request(RequestEvent::new("GET", url("/x")));
    session.on_response(ResponseEvent::new(url("/x"), 200).with_body("{}"));
    let call = &session.calls()[0];
    assert_eq!(call.status_code, Some(200));
    assert_eq!(call.response_data, None);
}

#[tokio::test]
async fn test_failed_body_read_still_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let (session, clock) = session_with(config(&dir), CaptureType::Url).await;

    session.on_request(RequestEvent::new("GET", url("/stream")));
    clock.advance_ms(7);
    assert!(session.on_response(ResponseEvent::new(url("/stream"), 200).with_body_error("connection reset")));

    let call = &session.calls()[0];
    assert_eq!(call.response_time, Some(7));
    assert_eq!(call.response_data, None);
    let errors = session.metrics().errors;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("connection reset"));
}

#[tokio::test]
async fn test_performance_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (session, clock) = session_with(config(&dir), CaptureType::Url).await;

    assert_eq!(session.performance_summary().average_response_time, 0.0);

    session.on_request(RequestEvent::new("GET", url("/a")));
    session.on_request(RequestEvent::new("GET", url("/b")));
    session.on_request(RequestEvent::new("GET", url("/c")));
    clock.advance_ms(10);
    session.on_response(ResponseEvent::new(url("/a"), 200));
    clock.advance_ms(20);
    session.on_response(ResponseEvent::new(url("/b"), 404));

    let summary = session.performance_summary();
    assert_eq!(summary.total_calls, 3);
    assert_eq!(summary.resolved_calls, 2);
    assert_eq!(summary.pending_calls, 1);
    assert_eq!(summary.average_response_time, 20.0);
    assert_eq!(summary.min_response_time, Some(10));
    assert_eq!(summary.max_response_time, Some(30));
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
}

#[tokio::test]
async fn test_finalize_records_steps_and_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (session, clock) = session_with(config(&dir), CaptureType::Url).await;

    session.add_step("login");
    clock.advance_ms(2_000);
    session.add_error("order rejected");
    session.on_request(RequestEvent::new("POST", url("/order")));

    let report = session.finalize().await.unwrap();
    assert_eq!(report.metrics.duration_ms, 2_000);
    assert_eq!(report.metrics.total_calls, 1);

    let raw = RawCallFile::read(session.raw_path()).await.unwrap();
    let meta = raw.metadata;
    assert_eq!(meta.end_time.as_deref(), Some("1970-01-01T00:16:42.000Z"));
    assert_eq!(meta.test_steps.unwrap(), ["[1970-01-01T00:16:40.000Z] login"]);
    assert_eq!(meta.errors.unwrap(), ["order rejected"]);
    assert_eq!(meta.performance_summary.unwrap().pending_calls, 1);
}

#[tokio::test]
async fn test_finalize_trusts_memory_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    for i in 0..3 {
        session.on_request(RequestEvent::new("GET", url(&format!("/api/{i}"))));
    }
    session.writer().flush_now().await.unwrap();

    // something truncated the file behind our back
    let mut stale = RawCallFile::read(session.raw_path()).await.unwrap();
    stale.api_calls.truncate(1);
    stale.write(session.raw_path()).await.unwrap();

    let report = session.finalize().await.unwrap();
    assert_eq!(report.total_calls, 3);
    let raw = RawCallFile::read(session.raw_path()).await.unwrap();
    assert_eq!(raw.api_calls.len(), 3);
    assert_eq!(raw.metadata.total_calls, 3);
}

#[tokio::test]
async fn test_finalize_rebuilds_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    session.on_request(RequestEvent::new("GET", url("/a")));
    std::fs::write(session.raw_path(), "{ not json").unwrap();

    let report = session.finalize().await.unwrap();
    assert_eq!(report.total_calls, 1);
    let raw = RawCallFile::read(session.raw_path()).await.unwrap();
    assert_eq!(raw.metadata.status, RunStatus::Completed);
    assert_eq!(raw.api_calls[0].url, url("/a"));
    assert!(!raw.metadata.errors.unwrap().is_empty());
}

#[tokio::test]
async fn test_finalize_twice_fails_and_later_events_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    session.on_request(RequestEvent::new("GET", url("/a")));
    session.finalize().await.unwrap();
    assert!(session.is_finalized());

    assert_eq!(session.on_request(RequestEvent::new("GET", url("/b"))), None);
    assert!(!session.on_response(ResponseEvent::new(url("/a"), 200)));
    assert!(matches!(
        session.finalize().await,
        Err(CaptureError::AlreadyFinalized)
    ));
    assert_eq!(session.len(), 1);
}

#[tokio::test]
async fn test_finalize_surfaces_exhausted_retries() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut cfg = config(&dir).with_output_dir(&out);
    cfg.max_flush_retries = 1;
    let (session, _clock) = session_with(cfg, CaptureType::Url).await;

    std::fs::remove_dir_all(&out).unwrap();
    std::fs::write(&out, "not a directory").unwrap();

    session.on_request(RequestEvent::new("GET", url("/a")));
    assert!(session.writer().flush_now().await.is_err());
    assert!(session.writer().is_exhausted());

    let err = session.finalize().await.unwrap_err();
    assert!(matches!(err, CaptureError::FlushRetriesExhausted { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_capture_queues_snapshots_in_capture_order() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _clock) = session_with(config(&dir), CaptureType::Url).await;

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let session = session.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    let target = url(&format!("/api/w{worker}/{i}"));
                    session.on_request(RequestEvent::new("GET", &target));
                    session.on_response(ResponseEvent::new(&target, 200));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let queued = session.writer().take_pending();
    assert_eq!(queued.len(), 2000);
    let seqs: Vec<u64> = queued.iter().map(|c| c.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]), "queue out of seq order");
    // a pending snapshot never replaces the resolved one
    assert!(queued.iter().all(|c| !c.is_pending()));

    let calls = session.calls();
    assert!(queued.iter().zip(&calls).all(|(q, c)| q.url == c.url));
}
