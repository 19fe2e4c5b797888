// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Postman Collection v2.1.0 projection of the raw calls file.
//!
//! The collection is always rebuilt wholesale from the raw file; it is never
//! patched incrementally. [`project`] is pure, so projecting the same raw
//! content twice yields identical documents.

use crate::call::CapturedCall;
use crate::store::{RawCallFile, RunStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub const POSTMAN_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostmanCollection {
    pub info: PostmanInfo,
    pub item: Vec<PostmanItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostmanInfo {
    pub name: String,
    pub schema: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostmanItem {
    pub name: String,
    pub request: PostmanRequest,
    pub response: Vec<PostmanResponse>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostmanRequest {
    pub method: String,
    pub header: Vec<PostmanHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PostmanBody>,
    pub url: PostmanUrl,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmanHeader {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmanBody {
    pub mode: String,
    pub raw: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmanUrl {
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<PostmanHeader>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostmanResponse {
    pub name: String,
    pub status: String,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    pub body: String,
}

/// Default collection name for an environment and capture type.
pub fn collection_name(raw: &RawCallFile) -> String {
    format!(
        "OMS API Collection - {} ({})",
        raw.metadata.environment.to_ascii_uppercase(),
        raw.metadata.capture_type
    )
}

/// Build the collection from the raw file. One item per call, raw order.
pub fn project(raw: &RawCallFile, name: &str) -> PostmanCollection {
    let meta = &raw.metadata;
    let status = match meta.status {
        RunStatus::Running => "running",
        RunStatus::Completed => "completed",
    };
    let description = format!(
        "API calls captured in {} ({} capture). {} calls, started {}, status {}.",
        meta.environment,
        meta.capture_type,
        raw.api_calls.len(),
        meta.start_time,
        status
    );

    PostmanCollection {
        info: PostmanInfo {
            name: name.to_string(),
            schema: POSTMAN_SCHEMA.to_string(),
            description,
        },
        item: raw.api_calls.iter().map(item_for).collect(),
    }
}

/// `"{METHOD} {url}"`, plus `" ({status})"` and `" - {N}ms"` when known.
pub fn item_name(call: &CapturedCall) -> String {
    let mut name = format!("{} {}", call.method, call.url);
    if let Some(status) = call.status_code {
        name.push_str(&format!(" ({status})"));
    }
    if let Some(ms) = call.response_time {
        name.push_str(&format!(" - {ms}ms"));
    }
    name
}

fn item_for(call: &CapturedCall) -> PostmanItem {
    let request = PostmanRequest {
        method: call.method.clone(),
        header: call
            .headers
            .iter()
            .map(|(key, value)| PostmanHeader {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
        body: call.body.as_ref().map(|raw| PostmanBody {
            mode: "raw".to_string(),
            raw: raw.clone(),
        }),
        url: postman_url(&call.url),
    };

    let response = call
        .status_code
        .map(|code| PostmanResponse {
            name: format!("Response {code}"),
            status: reason_phrase(code).to_string(),
            code,
            response_time: call.response_time,
            body: response_body(call.response_data.as_ref()),
        })
        .into_iter()
        .collect();

    PostmanItem {
        name: item_name(call),
        request,
        response,
    }
}

fn response_body(data: Option<&Value>) -> String {
    match data {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

/// Split a URL into Postman's structured form; unparseable URLs keep `raw`
/// only.
fn postman_url(raw: &str) -> PostmanUrl {
    let mut url = PostmanUrl {
        raw: raw.to_string(),
        protocol: None,
        host: Vec::new(),
        port: None,
        path: Vec::new(),
        query: Vec::new(),
    };
    let Ok(parsed) = Url::parse(raw) else {
        return url;
    };

    url.protocol = Some(parsed.scheme().to_string());
    url.host = parsed
        .host_str()
        .map(|h| h.split('.').map(str::to_string).collect())
        .unwrap_or_default();
    url.port = parsed.port().map(|p| p.to_string());
    url.path = parsed
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    url.query = parsed
        .query_pairs()
        .map(|(key, value)| PostmanHeader {
            key: key.into_owned(),
            value: value.into_owned(),
        })
        .collect();
    url
}

fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

#[cfg(test)]
#[path = "postman_tests.rs"]
mod tests;
