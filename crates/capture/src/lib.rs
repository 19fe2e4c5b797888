// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! API call capture for OMS end-to-end tests.
//!
//! A [`CaptureSession`] observes the network traffic of one test run,
//! keeps calls to the configured OMS domains, correlates each response with
//! its request, and streams the result to a raw JSON file plus a Postman
//! collection while the run is still going. [`CaptureSession::finalize`]
//! writes the completed files with timing statistics.

pub mod call;
pub mod config;
pub mod env;
pub mod error;
pub mod event;
pub mod filter;
pub mod har;
pub mod matcher;
pub mod metrics;
pub mod postman;
pub mod session;
pub mod store;
pub mod time;
pub mod writer;

pub use call::{CallState, CapturedCall};
pub use config::{CaptureConfig, CaptureType};
pub use error::{CaptureError, ConfigError, Result};
pub use event::{BodyCapture, RequestEvent, ResponseEvent};
pub use filter::{BodyFilter, CommandFilter, DEFAULT_OMS_COMMANDS};
pub use har::{Har, HarError, ReplaySummary};
pub use matcher::DomainMatcher;
pub use metrics::{MetricsSnapshot, PerformanceSummary};
pub use postman::PostmanCollection;
pub use session::{CaptureSession, FinalReport, SessionBuilder};
pub use store::{RawCallFile, RawMetadata, RunStatus};
pub use time::{Clock, ClockHandle, FakeClock, SystemClock};
pub use writer::StreamWriter;
