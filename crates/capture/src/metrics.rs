// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Run metrics and performance summaries.

use crate::call::CapturedCall;
use crate::time::iso_from_millis;
use serde::{Deserialize, Serialize};

/// Response time statistics over a set of calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total_calls: usize,
    pub resolved_calls: usize,
    pub pending_calls: usize,
    /// Mean over resolved calls; 0 when none resolved
    pub average_response_time: f64,
    pub min_response_time: Option<u64>,
    pub max_response_time: Option<u64>,
    /// Resolved with a 2xx/3xx status
    pub success_count: usize,
    /// Resolved with a 4xx/5xx status
    pub failure_count: usize,
}

impl PerformanceSummary {
    pub fn from_calls(calls: &[CapturedCall]) -> Self {
        let times: Vec<u64> = calls.iter().filter_map(|c| c.response_time).collect();
        let average_response_time = if times.is_empty() {
            0.0
        } else {
            let sum: u64 = times.iter().sum();
            sum as f64 / times.len() as f64
        };
        let resolved = calls.iter().filter(|c| !c.is_pending());
        let success_count = resolved.clone().filter(|c| c.is_success()).count();
        let failure_count = resolved
            .filter(|c| c.status_code.is_some_and(|s| s >= 400))
            .count();

        Self {
            total_calls: calls.len(),
            resolved_calls: times.len(),
            pending_calls: calls.len() - times.len(),
            average_response_time,
            min_response_time: times.iter().min().copied(),
            max_response_time: times.iter().max().copied(),
            success_count,
            failure_count,
        }
    }
}

/// Point-in-time copy of a session's metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub start_time: String,
    pub end_time: String,
    pub duration_ms: u64,
    pub total_calls: usize,
    pub test_steps: Vec<String>,
    pub errors: Vec<String>,
}

/// Session-scoped run metrics.
#[derive(Clone, Debug)]
pub struct Metrics {
    start_ms: u64,
    total_calls: usize,
    steps: Vec<String>,
    errors: Vec<String>,
}

impl Metrics {
    pub fn new(start_ms: u64) -> Self {
        Self {
            start_ms,
            total_calls: 0,
            steps: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn start_time(&self) -> String {
        iso_from_millis(self.start_ms)
    }

    pub fn record_call(&mut self) {
        self.total_calls += 1;
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls
    }

    /// Append a timestamped step description.
    pub fn add_step(&mut self, now_ms: u64, description: &str) {
        self.steps
            .push(format!("[{}] {}", iso_from_millis(now_ms), description));
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Snapshot with `end_time` taken at `now_ms`.
    pub fn snapshot(&self, now_ms: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            start_time: self.start_time(),
            end_time: iso_from_millis(now_ms),
            duration_ms: now_ms.saturating_sub(self.start_ms),
            total_calls: self.total_calls,
            test_steps: self.steps.clone(),
            errors: self.errors.clone(),
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
