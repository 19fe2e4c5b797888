// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk raw calls file and JSON write helpers.

use crate::call::CapturedCall;
use crate::config::CaptureType;
use crate::error::{CaptureError, Result};
use crate::metrics::PerformanceSummary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lifecycle status recorded in the raw file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
}

/// Metadata envelope of the raw calls file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    pub environment: String,
    pub capture_type: CaptureType,
    pub start_time: String,
    pub status: RunStatus,
    pub total_calls: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_summary: Option<PerformanceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// The raw calls file: metadata plus every captured call in capture order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCallFile {
    pub metadata: RawMetadata,
    #[serde(default)]
    pub api_calls: Vec<CapturedCall>,
}

impl RawCallFile {
    /// Empty file for a freshly started session.
    pub fn new(environment: &str, capture_type: CaptureType, start_time: String) -> Self {
        Self {
            metadata: RawMetadata {
                environment: environment.to_string(),
                capture_type,
                start_time,
                status: RunStatus::Running,
                total_calls: 0,
                last_updated: None,
                end_time: None,
                performance_summary: None,
                test_steps: None,
                errors: None,
            },
            api_calls: Vec::new(),
        }
    }

    /// Insert a call, replacing an earlier snapshot with the same sequence
    /// number. New calls are appended so file order stays capture order.
    pub fn upsert(&mut self, call: CapturedCall) {
        match self.api_calls.iter().rposition(|c| c.seq == call.seq) {
            Some(idx) => self.api_calls[idx] = call,
            None => self.api_calls.push(call),
        }
        self.metadata.total_calls = self.api_calls.len();
    }

    pub async fn read(path: &Path) -> Result<Self> {
        read_json(path).await
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self).await
    }
}

/// Read and parse a JSON file.
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CaptureError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| CaptureError::json(path, e))
}

/// Write pretty JSON through a temp sibling and rename, so readers never see
/// a half-written file.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CaptureError::json(path, e))?;
    ensure_parent_exists(path).await?;
    let tmp = temp_sibling(path);
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| CaptureError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| CaptureError::io(path, e))
}

async fn ensure_parent_exists(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CaptureError::io(parent, e))?;
        }
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
