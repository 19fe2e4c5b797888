// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by the capture utility are defined
//! here. Use these accessors instead of calling `std::env::var()` directly.

/// Generated env var name constants.
mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

// Re-export name constants for callers that need the raw name string.
pub use names::*;

use std::path::PathBuf;

/// `OMS_ENV`: Target environment name (e.g. `uat`, `sit`).
pub fn environment() -> Option<String> {
    var_nonempty(names::OMS_ENV)
}

/// `OMS_CAPTURE_CONFIG`: Path to a TOML capture config file.
pub fn config_path() -> Option<PathBuf> {
    var_nonempty(names::OMS_CAPTURE_CONFIG).map(PathBuf::from)
}

/// `OMS_CAPTURE_DIR`: Output directory for capture files.
pub fn capture_dir() -> Option<PathBuf> {
    var_nonempty(names::OMS_CAPTURE_DIR).map(PathBuf::from)
}

/// `OMS_CAPTURE_DEBOUNCE_MS`: Idle interval before queued calls are flushed.
pub fn debounce_ms() -> Option<u64> {
    var_u64(names::OMS_CAPTURE_DEBOUNCE_MS)
}

/// `OMS_POSTMAN_INTERVAL_MS`: Max staleness of the Postman collection.
pub fn postman_interval_ms() -> Option<u64> {
    var_u64(names::OMS_POSTMAN_INTERVAL_MS)
}

/// `OMS_MAX_RESPONSE_BYTES`: Response body truncation cap.
pub fn max_response_bytes() -> Option<usize> {
    var_nonempty(names::OMS_MAX_RESPONSE_BYTES).and_then(|v| v.trim().parse().ok())
}

/// Name of the per-environment domain list variable, e.g. `OMS_UAT_DOMAINS`.
pub fn domains_var(environment: &str) -> String {
    let env: String = environment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("OMS_{env}_DOMAINS")
}

/// `OMS_<ENV>_DOMAINS`: Comma-separated base URLs for an environment.
pub fn domains(environment: &str) -> Option<Vec<String>> {
    var_nonempty(&domains_var(environment)).map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

fn var_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_u64(name: &str) -> Option<u64> {
    var_nonempty(name).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
