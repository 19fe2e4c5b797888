// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for capture sessions.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors surfaced by a capture session.
///
/// Matching, body capture and background flush failures are recovered
/// locally and never produce one of these; only session start and
/// `finalize` return them.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("capture file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("stream writer gave up after {attempts} failed flushes: {last_error}")]
    FlushRetriesExhausted { attempts: u32, last_error: String },

    #[error("capture session already finalized")]
    AlreadyFinalized,
}

impl CaptureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Errors loading or resolving capture configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no domains configured for environment '{0}'")]
    NoDomains(String),

    #[error("invalid capture type: {0}")]
    InvalidCaptureType(String),
}
