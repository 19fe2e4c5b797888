// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network events delivered by the host test harness.

use std::collections::BTreeMap;

/// An observed outgoing request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestEvent {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl RequestEvent {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Outcome of reading a response body.
///
/// Reading a body is best effort: harnesses report failures here instead of
/// failing the event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BodyCapture {
    /// The harness did not try to read the body
    #[default]
    NotCaptured,
    Text(String),
    /// The read failed; the reason is logged
    Failed(String),
}

/// An observed response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseEvent {
    pub url: String,
    pub status: u16,
    pub body: BodyCapture,
}

impl ResponseEvent {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            body: BodyCapture::NotCaptured,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = BodyCapture::Text(body.into());
        self
    }

    pub fn with_body_error(mut self, reason: impl Into<String>) -> Self {
        self.body = BodyCapture::Failed(reason.into());
        self
    }
}
