// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capture sessions: one test run's interception and persistence pipeline.

use crate::call::{response_data, CapturedCall};
use crate::config::{CaptureConfig, CaptureType};
use crate::error::{CaptureError, Result};
use crate::event::{BodyCapture, RequestEvent, ResponseEvent};
use crate::filter::{BodyFilter, CommandFilter};
use crate::matcher::DomainMatcher;
use crate::metrics::{Metrics, MetricsSnapshot, PerformanceSummary};
use crate::postman::collection_name;
use crate::store::{RawCallFile, RunStatus};
use crate::time::{iso_from_millis, Clock, ClockHandle};
use crate::writer::{StreamWriter, WriterSettings, WriterTargets};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Summary returned by [`CaptureSession::finalize`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub raw_path: PathBuf,
    pub postman_path: PathBuf,
    pub total_calls: usize,
    pub performance: PerformanceSummary,
    pub metrics: MetricsSnapshot,
}

/// Builder for [`CaptureSession`].
pub struct SessionBuilder {
    config: CaptureConfig,
    capture_type: CaptureType,
    filter: FilterChoice,
    clock: ClockHandle,
}

enum FilterChoice {
    Default,
    None,
    Custom(Box<dyn BodyFilter>),
}

impl SessionBuilder {
    /// Narrow capture with a custom body filter.
    pub fn filter(mut self, filter: impl BodyFilter + 'static) -> Self {
        self.filter = FilterChoice::Custom(Box::new(filter));
        self
    }

    /// Capture every matched request, even for body sessions.
    pub fn no_filter(mut self) -> Self {
        self.filter = FilterChoice::None;
        self
    }

    pub fn clock(mut self, clock: ClockHandle) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve domains, create both output files in `running` state, and
    /// return the live session.
    pub async fn start(self) -> Result<CaptureSession> {
        let matcher = DomainMatcher::new(self.config.base_urls()?);
        let filter: Option<Box<dyn BodyFilter>> = match (self.filter, self.capture_type) {
            (FilterChoice::Custom(f), _) => Some(f),
            (FilterChoice::None, _) => None,
            (FilterChoice::Default, CaptureType::Url) => None,
            (FilterChoice::Default, CaptureType::Body) if self.config.commands.is_empty() => {
                Some(Box::new(CommandFilter::oms_default()))
            }
            (FilterChoice::Default, CaptureType::Body) => {
                Some(Box::new(CommandFilter::new(&self.config.commands)))
            }
        };

        let start_ms = self.clock.now_millis();
        let template = RawCallFile::new(
            &self.config.environment,
            self.capture_type,
            iso_from_millis(start_ms),
        );
        let raw_path = self.config.raw_file_path(self.capture_type);
        let postman_path = self.config.postman_file_path(self.capture_type);

        let writer = StreamWriter::new(
            WriterTargets {
                raw_path: raw_path.clone(),
                postman_path: postman_path.clone(),
                collection_name: collection_name(&template),
                template: template.clone(),
            },
            WriterSettings {
                debounce: self.config.debounce(),
                postman_interval_ms: self.config.postman_interval_ms,
                max_flush_retries: self.config.max_flush_retries,
            },
            self.clock.clone(),
        );

        template.write(&raw_path).await?;
        writer.write_postman(&template).await?;

        info!(
            environment = %self.config.environment,
            capture_type = %self.capture_type,
            origins = ?matcher.origins(),
            raw = %raw_path.display(),
            "api capture session started"
        );

        Ok(CaptureSession {
            inner: Arc::new(Inner {
                config: self.config,
                capture_type: self.capture_type,
                matcher,
                filter,
                clock: self.clock,
                calls: Mutex::new(Vec::new()),
                metrics: Mutex::new(Metrics::new(start_ms)),
                writer,
                template,
                raw_path,
                postman_path,
                finalized: AtomicBool::new(false),
            }),
        })
    }
}

/// A live capture session. Clones share the same buffer and files.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<Inner>,
}

struct Inner {
    config: CaptureConfig,
    capture_type: CaptureType,
    matcher: DomainMatcher,
    filter: Option<Box<dyn BodyFilter>>,
    clock: ClockHandle,
    calls: Mutex<Vec<CapturedCall>>,
    metrics: Mutex<Metrics>,
    writer: StreamWriter,
    template: RawCallFile,
    raw_path: PathBuf,
    postman_path: PathBuf,
    finalized: AtomicBool,
}

impl CaptureSession {
    pub fn builder(config: CaptureConfig, capture_type: CaptureType) -> SessionBuilder {
        SessionBuilder {
            config,
            capture_type,
            filter: FilterChoice::Default,
            clock: ClockHandle::system(),
        }
    }

    /// Start a session with the default filter and the system clock.
    pub async fn start(config: CaptureConfig, capture_type: CaptureType) -> Result<Self> {
        Self::builder(config, capture_type).start().await
    }

    /// Record a request if its origin is configured and the body filter (if
    /// any) accepts it. Returns the new call's sequence number.
    pub fn on_request(&self, event: RequestEvent) -> Option<u64> {
        let inner = &self.inner;
        if inner.finalized.load(Ordering::SeqCst) {
            debug!(url = %event.url, "session finalized, ignoring request");
            return None;
        }
        if !inner.matcher.matches(&event.url) {
            debug!(url = %event.url, "request outside configured domains");
            return None;
        }
        if let Some(filter) = &inner.filter {
            if !filter.accepts(&event.url, event.body.as_deref()) {
                debug!(url = %event.url, "request rejected by body filter");
                return None;
            }
        }

        let now = inner.clock.now_millis();
        // Enqueue under the buffer lock so the writer sees snapshots in seq order.
        let call = {
            let mut calls = inner.calls.lock();
            let call = CapturedCall {
                seq: calls.len() as u64,
                url: event.url,
                method: event.method,
                headers: event.headers,
                body: event.body,
                timestamp: iso_from_millis(now),
                response_time: None,
                status_code: None,
                response_data: None,
                started_at_ms: now,
            };
            calls.push(call.clone());
            inner.writer.enqueue(call.clone());
            call
        };
        inner.metrics.lock().record_call();
        debug!(seq = call.seq, method = %call.method, url = %call.url, "captured request");
        Some(call.seq)
    }

    /// Resolve the oldest pending call for the response's URL.
    ///
    /// Returns false when no pending call matches; that is not an error.
    pub fn on_response(&self, event: ResponseEvent) -> bool {
        let inner = &self.inner;
        if inner.finalized.load(Ordering::SeqCst) {
            return false;
        }

        let now = inner.clock.now_millis();
        let (snapshot, body_error) = {
            let mut calls = inner.calls.lock();
            let Some(call) = calls
                .iter_mut()
                .find(|c| c.url == event.url && c.is_pending())
            else {
                debug!(url = %event.url, status = event.status, "response without pending request");
                return false;
            };
            let (data, body_error) = self.response_body(&event.body);
            call.resolve(now, event.status, data);
            inner.writer.enqueue(call.clone());
            (call.clone(), body_error)
        };

        if let Some(reason) = body_error {
            warn!(url = %event.url, %reason, "could not read response body");
            inner
                .metrics
                .lock()
                .add_error(format!("response body for {}: {}", event.url, reason));
        }
        debug!(
            seq = snapshot.seq,
            status = event.status,
            response_time = snapshot.response_time,
            "resolved call"
        );
        true
    }

    fn response_body(&self, body: &BodyCapture) -> (Option<Value>, Option<String>) {
        let config = &self.inner.config;
        match body {
            BodyCapture::NotCaptured => (None, None),
            BodyCapture::Text(_) if !config.capture_response_bodies => (None, None),
            BodyCapture::Text(text) => {
                if text.len() > config.max_response_bytes {
                    debug!(size = text.len(), "truncating response body");
                }
                (Some(response_data(text, config.max_response_bytes)), None)
            }
            BodyCapture::Failed(reason) => (None, Some(reason.clone())),
        }
    }

    /// Append a timestamped, human-readable step to the run log.
    pub fn add_step(&self, description: &str) {
        let now = self.inner.clock.now_millis();
        self.inner.metrics.lock().add_step(now, description);
        info!(step = description, "capture step");
    }

    pub fn add_error(&self, message: impl Into<String>) {
        self.inner.metrics.lock().add_error(message);
    }

    /// Metrics snapshot with `endTime` set to now.
    pub fn metrics(&self) -> MetricsSnapshot {
        let now = self.inner.clock.now_millis();
        self.inner.metrics.lock().snapshot(now)
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        PerformanceSummary::from_calls(&self.inner.calls.lock())
    }

    /// Copy of every captured call in capture order.
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.inner.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.calls.lock().is_empty()
    }

    pub fn capture_type(&self) -> CaptureType {
        self.inner.capture_type
    }

    pub fn raw_path(&self) -> &Path {
        &self.inner.raw_path
    }

    pub fn postman_path(&self) -> &Path {
        &self.inner.postman_path
    }

    pub fn writer(&self) -> &StreamWriter {
        &self.inner.writer
    }

    pub fn is_finalized(&self) -> bool {
        self.inner.finalized.load(Ordering::SeqCst)
    }

    /// Force-flush, mark the raw file completed with final metrics, and
    /// regenerate the Postman collection.
    ///
    /// The in-memory buffer is the source of truth: if the file disagrees
    /// on the call count it is overwritten. Failures are logged and
    /// returned.
    pub async fn finalize(&self) -> Result<FinalReport> {
        if self.inner.finalized.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyFinalized);
        }
        let result = self.finalize_files().await;
        match &result {
            Ok(report) => info!(
                total_calls = report.total_calls,
                average_ms = report.performance.average_response_time,
                raw = %report.raw_path.display(),
                postman = %report.postman_path.display(),
                "api capture session finalized"
            ),
            Err(e) => error!(error = %e, "failed to finalize api capture session"),
        }
        result
    }

    async fn finalize_files(&self) -> Result<FinalReport> {
        let inner = &self.inner;
        let writer = &inner.writer;
        let guard = writer.acquire().await;

        let final_flush_failed = match writer.flush_locked(&guard).await {
            Ok(_) => false,
            Err(e) => {
                self.add_error(format!("final flush failed: {e}"));
                if writer.is_exhausted() {
                    writer.close();
                    return Err(writer.exhausted_error());
                }
                warn!(error = %e, "final flush failed, rewriting from memory");
                true
            }
        };
        writer.close();
        writer.take_pending();

        let calls = inner.calls.lock().clone();
        let mut file = match RawCallFile::read(&inner.raw_path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "raw calls file unreadable, rebuilding from memory");
                inner.template.clone()
            }
        };
        if file.api_calls.len() != calls.len() || final_flush_failed {
            if file.api_calls.len() != calls.len() {
                warn!(
                    file = file.api_calls.len(),
                    memory = calls.len(),
                    "raw file call count differs from memory, rewriting"
                );
            }
            file.api_calls = calls;
        }

        let now = inner.clock.now_millis();
        let performance = PerformanceSummary::from_calls(&file.api_calls);
        let metrics = inner.metrics.lock().snapshot(now);
        let meta = &mut file.metadata;
        meta.status = RunStatus::Completed;
        meta.total_calls = file.api_calls.len();
        meta.last_updated = Some(iso_from_millis(now));
        meta.end_time = Some(metrics.end_time.clone());
        meta.performance_summary = Some(performance.clone());
        meta.test_steps = Some(metrics.test_steps.clone());
        meta.errors = Some(metrics.errors.clone());

        file.write(&inner.raw_path).await?;
        writer.write_postman(&file).await?;
        drop(guard);

        Ok(FinalReport {
            raw_path: inner.raw_path.clone(),
            postman_path: inner.postman_path.clone(),
            total_calls: file.api_calls.len(),
            performance,
            metrics,
        })
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
