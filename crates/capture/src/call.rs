// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Captured call records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One intercepted HTTP request, filled in when its response arrives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedCall {
    /// Sequence number within the session, used to upsert snapshots
    pub seq: u64,

    pub url: String,
    pub method: String,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<String>,

    /// Capture time, RFC 3339
    pub timestamp: String,

    /// Milliseconds between request and response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Response body; null when not captured or unreadable
    #[serde(default)]
    pub response_data: Option<Value>,

    /// Request start in clock millis; not persisted
    #[serde(skip)]
    pub(crate) started_at_ms: u64,
}

/// Correlation state of a captured call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallState {
    /// No response seen yet
    Pending,
    /// Response time and status recorded; terminal
    Resolved,
}

impl CapturedCall {
    pub fn state(&self) -> CallState {
        if self.response_time.is_some() {
            CallState::Resolved
        } else {
            CallState::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == CallState::Pending
    }

    /// Record the response. Only the first call has any effect.
    pub(crate) fn resolve(&mut self, now_ms: u64, status: u16, data: Option<Value>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.response_time = Some(now_ms.saturating_sub(self.started_at_ms));
        self.status_code = Some(status);
        self.response_data = data;
        true
    }

    /// True for 2xx and 3xx status codes.
    pub fn is_success(&self) -> bool {
        self.status_code.is_some_and(|s| (200..400).contains(&s))
    }
}

/// Convert a response body into stored response data.
///
/// Bodies over `max_bytes` are cut and marked with their original size.
/// Bodies within the cap that parse as JSON are stored as JSON values.
pub fn response_data(text: &str, max_bytes: usize) -> Value {
    if text.len() > max_bytes {
        return Value::String(truncate_body(text, max_bytes));
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Cut `text` to at most `max_bytes` on a char boundary and append the
/// truncation marker.
pub fn truncate_body(text: &str, max_bytes: usize) -> String {
    let mut end = max_bytes.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... [TRUNCATED - original size: {} bytes]",
        &text[..end],
        text.len()
    )
}

#[cfg(test)]
#[path = "call_tests.rs"]
mod tests;
