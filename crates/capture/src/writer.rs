// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced, single-flight streaming of captured calls to disk.
//!
//! Snapshots are queued by [`StreamWriter::enqueue`] and written after the
//! queue has been idle for the debounce interval. At most one flush runs at
//! a time; a timer that fires during a flush leaves its calls queued and the
//! running flush re-arms the timer when it finishes. Failed flushes keep
//! their calls queued, so persistence is at-least-once.

use crate::call::CapturedCall;
use crate::error::{CaptureError, Result};
use crate::postman::project;
use crate::store::{write_json, RawCallFile};
use crate::time::{Clock, ClockHandle};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Regenerate the Postman collection whenever the total is a multiple of this.
pub const POSTMAN_EVERY_N_CALLS: usize = 5;

/// Timing and retry knobs for a writer.
#[derive(Clone, Debug)]
pub struct WriterSettings {
    pub debounce: Duration,
    /// Max age of the Postman collection before a flush regenerates it
    pub postman_interval_ms: u64,
    /// Consecutive failures before automatic flushing stops; 0 never stops
    pub max_flush_retries: u32,
}

/// Output locations and the envelope used when the raw file is missing.
#[derive(Clone, Debug)]
pub struct WriterTargets {
    pub raw_path: PathBuf,
    pub postman_path: PathBuf,
    pub collection_name: String,
    pub template: RawCallFile,
}

/// Handle to a session's stream writer. Clones share state.
#[derive(Clone)]
pub struct StreamWriter {
    shared: Arc<Shared>,
}

struct Shared {
    targets: WriterTargets,
    settings: WriterSettings,
    clock: ClockHandle,
    state: Mutex<WriterState>,
    flushing: AtomicBool,
    flush_done: Notify,
    timer: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct WriterState {
    pending: Vec<CapturedCall>,
    consecutive_failures: u32,
    last_error: Option<String>,
    last_postman_ms: u64,
    flushed_total: usize,
    closed: bool,
}

/// Proof of holding the single-flight flag. Released on drop.
pub(crate) struct FlushGuard<'a> {
    shared: &'a Shared,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.shared.flushing.store(false, Ordering::SeqCst);
        self.shared.flush_done.notify_waiters();
    }
}

impl StreamWriter {
    pub fn new(targets: WriterTargets, settings: WriterSettings, clock: ClockHandle) -> Self {
        let state = WriterState {
            last_postman_ms: clock.now_millis(),
            ..WriterState::default()
        };
        Self {
            shared: Arc::new(Shared {
                targets,
                settings,
                clock,
                state: Mutex::new(state),
                flushing: AtomicBool::new(false),
                flush_done: Notify::new(),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Queue a call snapshot and restart the debounce timer.
    ///
    /// A newer snapshot replaces a queued one with the same sequence number.
    /// Never blocks and never fails.
    pub fn enqueue(&self, call: CapturedCall) {
        let rearm = {
            let mut state = self.shared.state.lock();
            if state.closed {
                debug!(seq = call.seq, "writer closed, dropping snapshot");
                return;
            }
            upsert(&mut state.pending, call);
            !self.shared.exhausted(state.consecutive_failures)
        };
        if rearm {
            schedule(&self.shared);
        } else {
            debug!("writer exhausted its retries, snapshot waits for finalize");
        }
    }

    /// Flush queued calls now, waiting for any in-flight flush first.
    /// Returns the raw file's call count.
    pub async fn flush_now(&self) -> Result<usize> {
        let guard = self.shared.acquire().await;
        let result = self.shared.flush_pending(&guard).await;
        drop(guard);
        if result.is_ok() && self.shared.should_rearm() {
            schedule(&self.shared);
        }
        result
    }

    /// Number of snapshots waiting to be written.
    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.state.lock().consecutive_failures
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().last_error.clone()
    }

    /// True once consecutive failures reached the retry ceiling.
    pub fn is_exhausted(&self) -> bool {
        let failures = self.shared.state.lock().consecutive_failures;
        self.shared.exhausted(failures)
    }

    /// Error describing an exhausted writer.
    pub(crate) fn exhausted_error(&self) -> CaptureError {
        let state = self.shared.state.lock();
        CaptureError::FlushRetriesExhausted {
            attempts: state.consecutive_failures,
            last_error: state.last_error.clone().unwrap_or_default(),
        }
    }

    pub(crate) async fn acquire(&self) -> FlushGuard<'_> {
        self.shared.acquire().await
    }

    pub(crate) async fn flush_locked(&self, guard: &FlushGuard<'_>) -> Result<usize> {
        self.shared.flush_pending(guard).await
    }

    /// Project `raw` and write the Postman collection.
    pub(crate) async fn write_postman(&self, raw: &RawCallFile) -> Result<()> {
        self.shared.write_postman(raw).await
    }

    /// Stop the timer and ignore later snapshots.
    pub(crate) fn close(&self) {
        self.shared.state.lock().closed = true;
        if let Some(timer) = self.shared.timer.lock().take() {
            timer.abort();
        }
    }

    /// Remove and return queued snapshots.
    pub(crate) fn take_pending(&self) -> Vec<CapturedCall> {
        std::mem::take(&mut self.shared.state.lock().pending)
    }
}

impl Shared {
    fn exhausted(&self, failures: u32) -> bool {
        self.settings.max_flush_retries > 0 && failures >= self.settings.max_flush_retries
    }

    fn should_rearm(&self) -> bool {
        let state = self.state.lock();
        !state.closed && !state.pending.is_empty() && !self.exhausted(state.consecutive_failures)
    }

    fn try_acquire(&self) -> Option<FlushGuard<'_>> {
        self.flushing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| FlushGuard { shared: self })
    }

    async fn acquire(&self) -> FlushGuard<'_> {
        loop {
            let notified = self.flush_done.notified();
            if let Some(guard) = self.try_acquire() {
                return guard;
            }
            notified.await;
        }
    }

    async fn flush_pending(&self, _guard: &FlushGuard<'_>) -> Result<usize> {
        let batch = std::mem::take(&mut self.state.lock().pending);
        if batch.is_empty() {
            return Ok(self.state.lock().flushed_total);
        }

        match self.write_batch(&batch).await {
            Ok(file) => {
                let total = file.api_calls.len();
                let now = self.clock.now_millis();
                let postman_due = {
                    let mut state = self.state.lock();
                    state.consecutive_failures = 0;
                    state.last_error = None;
                    state.flushed_total = total;
                    total % POSTMAN_EVERY_N_CALLS == 0
                        || now.saturating_sub(state.last_postman_ms)
                            > self.settings.postman_interval_ms
                };
                debug!(flushed = batch.len(), total, "flushed captured calls");
                if postman_due {
                    if let Err(e) = self.write_postman(&file).await {
                        warn!(error = %e, "failed to regenerate postman collection");
                    }
                }
                Ok(total)
            }
            Err(e) => {
                let (failures, exhausted) = {
                    let mut state = self.state.lock();
                    let newer = std::mem::take(&mut state.pending);
                    let mut restored = batch;
                    for call in newer {
                        upsert(&mut restored, call);
                    }
                    state.pending = restored;
                    state.consecutive_failures += 1;
                    state.last_error = Some(e.to_string());
                    (
                        state.consecutive_failures,
                        self.exhausted(state.consecutive_failures),
                    )
                };
                if exhausted {
                    error!(failures, error = %e, "flush failed, retry limit reached; holding calls for finalize");
                } else {
                    error!(failures, error = %e, "flush failed, calls stay queued for retry");
                }
                Err(e)
            }
        }
    }

    async fn write_batch(&self, batch: &[CapturedCall]) -> Result<RawCallFile> {
        let path = &self.targets.raw_path;
        let mut file = match RawCallFile::read(path).await {
            Ok(file) => file,
            Err(CaptureError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "raw calls file missing, recreating");
                self.targets.template.clone()
            }
            Err(e) => return Err(e),
        };
        for call in batch {
            file.upsert(call.clone());
        }
        file.metadata.last_updated = Some(self.clock.now_iso());
        file.write(path).await?;
        Ok(file)
    }

    async fn write_postman(&self, raw: &RawCallFile) -> Result<()> {
        let collection = project(raw, &self.targets.collection_name);
        write_json(&self.targets.postman_path, &collection).await?;
        self.state.lock().last_postman_ms = self.clock.now_millis();
        debug!(items = collection.item.len(), "regenerated postman collection");
        Ok(())
    }
}

/// (Re)start the debounce timer. Without a tokio runtime calls stay queued
/// until the next explicit flush.
fn schedule(shared: &Arc<Shared>) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("no tokio runtime, calls stay queued until flushed");
        return;
    };
    let task_shared = Arc::clone(shared);
    let timer = runtime.spawn(async move {
        tokio::time::sleep(task_shared.settings.debounce).await;
        // Detached so restarting the timer cannot cancel a write mid-flight.
        tokio::spawn(run_timer_flush(task_shared));
    });
    if let Some(previous) = shared.timer.lock().replace(timer) {
        previous.abort();
    }
}

async fn run_timer_flush(shared: Arc<Shared>) {
    let Some(guard) = shared.try_acquire() else {
        debug!("flush already in flight, calls wait for the next cycle");
        return;
    };
    let result = shared.flush_pending(&guard).await;
    drop(guard);
    if result.is_ok() && shared.should_rearm() {
        schedule(&shared);
    }
}

fn upsert(calls: &mut Vec<CapturedCall>, call: CapturedCall) {
    match calls.iter().position(|c| c.seq == call.seq) {
        Some(idx) => calls[idx] = call,
        None => calls.push(call),
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
