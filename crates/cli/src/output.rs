// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text and JSON rendering for command results.

use crate::cli::OutputFormat;
use oms_capture::har::ReplaySummary;
use oms_capture::{FinalReport, PerformanceSummary, RawCallFile, RunStatus};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// JSON shape of `summary`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutput<'a> {
    pub environment: &'a str,
    pub capture_type: &'a str,
    pub status: &'a str,
    pub performance: &'a PerformanceSummary,
}

/// JSON shape of `replay`.
#[derive(Debug, Serialize)]
pub struct ReplayOutput<'a> {
    pub replay: &'a ReplaySummary,
    pub report: &'a FinalReport,
}

fn status_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "running",
        RunStatus::Completed => "completed",
    }
}

pub fn write_summary<W: Write>(
    w: &mut W,
    raw: &RawCallFile,
    summary: &PerformanceSummary,
    format: OutputFormat,
) -> io::Result<()> {
    let meta = &raw.metadata;
    match format {
        OutputFormat::Json => {
            let output = SummaryOutput {
                environment: &meta.environment,
                capture_type: meta.capture_type.as_str(),
                status: status_str(meta.status),
                performance: summary,
            };
            serde_json::to_writer_pretty(&mut *w, &output)?;
            writeln!(w)
        }
        OutputFormat::Text => {
            writeln!(w, "environment:   {}", meta.environment)?;
            writeln!(w, "capture type:  {}", meta.capture_type)?;
            writeln!(w, "status:        {}", status_str(meta.status))?;
            write_performance(w, summary)
        }
    }
}

pub fn write_performance<W: Write>(w: &mut W, summary: &PerformanceSummary) -> io::Result<()> {
    writeln!(
        w,
        "calls:         {} ({} resolved, {} pending)",
        summary.total_calls, summary.resolved_calls, summary.pending_calls
    )?;
    writeln!(w, "average:       {:.1}ms", summary.average_response_time)?;
    if let (Some(min), Some(max)) = (summary.min_response_time, summary.max_response_time) {
        writeln!(w, "range:         {min}ms - {max}ms")?;
    }
    writeln!(
        w,
        "outcomes:      {} ok, {} failed",
        summary.success_count, summary.failure_count
    )
}

pub fn write_replay<W: Write>(
    w: &mut W,
    replay: &ReplaySummary,
    report: &FinalReport,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, &ReplayOutput { replay, report })?;
            writeln!(w)
        }
        OutputFormat::Text => {
            writeln!(
                w,
                "replayed {} entries: {} captured, {} resolved, {} unanswered",
                replay.entries, replay.captured, replay.resolved, replay.unanswered
            )?;
            writeln!(w, "raw:           {}", report.raw_path.display())?;
            writeln!(w, "postman:       {}", report.postman_path.display())?;
            write_performance(w, &report.performance)
        }
    }
}

pub fn write_domains<W: Write>(w: &mut W, environment: &str, origins: &[String]) -> io::Result<()> {
    writeln!(w, "{environment}:")?;
    for origin in origins {
        writeln!(w, "  {origin}")?;
    }
    Ok(())
}

/// Print an error message to stderr, red on a terminal.
pub fn print_error(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_error(&mut io::stderr(), msg, is_tty);
}

fn write_error<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    if is_terminal {
        let _ = writeln!(writer, "\x1b[31mError: {}\x1b[0m", msg);
    } else {
        let _ = writeln!(writer, "Error: {}", msg);
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
