// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capture configuration loaded from TOML files and environment overrides.

use crate::env;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default environment when neither config nor `OMS_ENV` names one
pub const DEFAULT_ENVIRONMENT: &str = "uat";
/// Default output directory for capture files
pub const DEFAULT_OUTPUT_DIR: &str = "test-results/api-capture";
/// Default idle interval before queued calls are flushed
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_000;
/// Default max staleness of the Postman collection
pub const DEFAULT_POSTMAN_INTERVAL_MS: u64 = 30_000;
/// Default response body truncation cap
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 50_000;
/// Default consecutive flush failures tolerated before giving up
pub const DEFAULT_MAX_FLUSH_RETRIES: u32 = 5;

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_postman_interval_ms() -> u64 {
    DEFAULT_POSTMAN_INTERVAL_MS
}

fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

fn default_capture_response_bodies() -> bool {
    true
}

fn default_max_flush_retries() -> u32 {
    DEFAULT_MAX_FLUSH_RETRIES
}

/// Which calls a session records, and which files it writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureType {
    /// Every call to a configured domain
    #[default]
    Url,
    /// Only calls whose body names a known backend command
    Body,
}

impl CaptureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for CaptureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "body" => Ok(Self::Body),
            other => Err(ConfigError::InvalidCaptureType(other.to_string())),
        }
    }
}

/// Top-level capture configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// Active environment name (e.g. "uat")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Directory receiving raw and Postman files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Base URLs per environment
    #[serde(default)]
    pub domains: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_postman_interval_ms")]
    pub postman_interval_ms: u64,

    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,

    #[serde(default = "default_capture_response_bodies")]
    pub capture_response_bodies: bool,

    /// Consecutive flush failures before the writer stops retrying
    #[serde(default = "default_max_flush_retries")]
    pub max_flush_retries: u32,

    /// Command names for body capture; empty means the built-in OMS set
    #[serde(default)]
    pub commands: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            output_dir: default_output_dir(),
            domains: BTreeMap::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            postman_interval_ms: DEFAULT_POSTMAN_INTERVAL_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            capture_response_bodies: true,
            max_flush_retries: DEFAULT_MAX_FLUSH_RETRIES,
            commands: Vec::new(),
        }
    }
}

impl CaptureConfig {
    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML config content.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from `OMS_CAPTURE_CONFIG` if set, otherwise defaults, then apply
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = match env::config_path() {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        Ok(config.apply_env())
    }

    /// Apply `OMS_*` environment overrides on top of this config.
    pub fn apply_env(self) -> Self {
        self.apply_env_for(None)
    }

    /// Like [`apply_env`](Self::apply_env), but an explicit `environment`
    /// wins over `OMS_ENV`. Domain overrides are read for the selected
    /// environment.
    pub fn apply_env_for(mut self, environment: Option<&str>) -> Self {
        if let Some(environment) = environment.map(str::to_string).or_else(env::environment) {
            self.environment = environment;
        }
        if let Some(dir) = env::capture_dir() {
            self.output_dir = dir;
        }
        if let Some(ms) = env::debounce_ms() {
            self.debounce_ms = ms;
        }
        if let Some(ms) = env::postman_interval_ms() {
            self.postman_interval_ms = ms;
        }
        if let Some(bytes) = env::max_response_bytes() {
            self.max_response_bytes = bytes;
        }
        if let Some(domains) = env::domains(&self.environment) {
            self.domains
                .insert(self.environment.to_ascii_lowercase(), domains);
        }
        self
    }

    /// Builder-style environment selection.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Builder-style domain list for an environment.
    pub fn with_domains<I, S>(mut self, environment: &str, base_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains.insert(
            environment.to_ascii_lowercase(),
            base_urls.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Builder-style output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Base URLs of the active environment.
    ///
    /// Environment keys are compared case-insensitively.
    pub fn base_urls(&self) -> Result<&[String], ConfigError> {
        let wanted = self.environment.to_ascii_lowercase();
        self.domains
            .iter()
            .find(|(env, _)| env.to_ascii_lowercase() == wanted)
            .map(|(_, urls)| urls.as_slice())
            .filter(|urls| !urls.is_empty())
            .ok_or_else(|| ConfigError::NoDomains(self.environment.clone()))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Raw calls file for a capture type.
    pub fn raw_file_path(&self, capture_type: CaptureType) -> PathBuf {
        self.output_dir
            .join(format!("api_calls_{}.json", capture_type.as_str()))
    }

    /// Postman collection file for a capture type.
    pub fn postman_file_path(&self, capture_type: CaptureType) -> PathBuf {
        self.output_dir.join(format!(
            "oms_postman_collection_{}_{}.json",
            capture_type.as_str(),
            self.environment.to_ascii_uppercase()
        ))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
