// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HAR 1.2 recordings as a source of network events.
//!
//! Replay turns each entry into a request event at `startedDateTime` and a
//! response event `time` milliseconds later, then delivers all events in
//! time order on a [`FakeClock`]. Overlapping requests therefore correlate
//! the same way they did in the recorded browser session.

use crate::event::{RequestEvent, ResponseEvent};
use crate::session::CaptureSession;
use crate::time::{millis_from_iso, FakeClock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum HarError {
    #[error("failed to read HAR file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse HAR file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("entry {index} has an invalid startedDateTime: {value}")]
    InvalidTimestamp { index: usize, value: String },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Har {
    pub log: HarLog,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct HarLog {
    #[serde(default)]
    pub entries: Vec<HarEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarEntry {
    pub started_date_time: String,
    /// Total elapsed time in milliseconds
    #[serde(default)]
    pub time: f64,
    pub request: HarRequest,
    pub response: HarResponse,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<HarHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<HarPostData>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HarHeader {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarPostData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HarResponse {
    /// 0 when the request never received a response
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<HarContent>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HarContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// Counts from one replay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub entries: usize,
    pub captured: usize,
    pub resolved: usize,
    /// Entries recorded without a response (status 0)
    pub unanswered: usize,
}

impl Har {
    pub fn load(path: &Path) -> Result<Self, HarError> {
        let content = std::fs::read_to_string(path).map_err(|source| HarError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| HarError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Start time of the earliest entry, for seeding the replay clock.
    pub fn first_started_ms(&self) -> Result<Option<u64>, HarError> {
        let mut first = None;
        for (index, entry) in self.log.entries.iter().enumerate() {
            let ms = entry.started_ms(index)?;
            first = Some(first.map_or(ms, |f: u64| f.min(ms)));
        }
        Ok(first)
    }
}

impl HarEntry {
    fn started_ms(&self, index: usize) -> Result<u64, HarError> {
        millis_from_iso(&self.started_date_time).ok_or_else(|| HarError::InvalidTimestamp {
            index,
            value: self.started_date_time.clone(),
        })
    }

    fn request_event(&self) -> RequestEvent {
        let mut event = RequestEvent::new(&self.request.method, &self.request.url);
        for header in &self.request.headers {
            // HTTP/2 pseudo-headers are not real request headers
            if !header.name.starts_with(':') {
                event = event.with_header(&header.name, &header.value);
            }
        }
        if let Some(text) = self.request.post_data.as_ref().and_then(|p| p.text.as_ref()) {
            event = event.with_body(text);
        }
        event
    }

    fn response_event(&self) -> ResponseEvent {
        let event = ResponseEvent::new(&self.request.url, self.response.status);
        let Some(content) = &self.response.content else {
            return event;
        };
        match (&content.text, content.encoding.as_deref()) {
            (Some(_), Some(encoding)) if !encoding.eq_ignore_ascii_case("utf-8") => {
                event.with_body_error(format!("{encoding}-encoded content is not replayed"))
            }
            (Some(text), _) => event.with_body(text),
            (None, _) => event,
        }
    }
}

enum Step<'a> {
    Request(&'a HarEntry),
    Response(&'a HarEntry),
}

/// Feed every entry of `har` through `session`, driving `clock` to each
/// event's recorded time. The session should be built on the same clock.
pub fn replay(har: &Har, session: &CaptureSession, clock: &FakeClock) -> Result<ReplaySummary, HarError> {
    let mut timeline: Vec<(u64, u8, usize, Step<'_>)> = Vec::new();
    let mut summary = ReplaySummary {
        entries: har.log.entries.len(),
        ..ReplaySummary::default()
    };

    for (index, entry) in har.log.entries.iter().enumerate() {
        let start = entry.started_ms(index)?;
        timeline.push((start, 0, index, Step::Request(entry)));
        if entry.response.status == 0 {
            summary.unanswered += 1;
            continue;
        }
        // float-to-int casts saturate, so absurd durations clamp to the end of time
        let elapsed = entry.time.max(0.0).round() as u64;
        timeline.push((start.saturating_add(elapsed), 1, index, Step::Response(entry)));
    }
    // requests before responses at the same instant, then recording order
    timeline.sort_by_key(|(at, kind, index, _)| (*at, *kind, *index));

    for (at, _, index, step) in timeline {
        clock.set(at);
        match step {
            Step::Request(entry) => {
                if session.on_request(entry.request_event()).is_some() {
                    summary.captured += 1;
                } else {
                    debug!(index, url = %entry.request.url, "entry not captured");
                }
            }
            Step::Response(entry) => {
                if session.on_response(entry.response_event()) {
                    summary.resolved += 1;
                }
            }
        }
    }

    info!(
        entries = summary.entries,
        captured = summary.captured,
        resolved = summary.resolved,
        "replayed HAR recording"
    );
    Ok(summary)
}

#[cfg(test)]
#[path = "har_tests.rs"]
mod tests;
