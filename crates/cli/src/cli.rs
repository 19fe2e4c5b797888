// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments for `oms-capture`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use oms_capture::env::{OMS_CAPTURE_CONFIG, OMS_ENV};
use oms_capture::CaptureType;
use std::path::PathBuf;

/// Inspect, replay, and convert OMS API capture files
#[derive(Parser, Debug)]
#[command(name = "oms-capture", version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a HAR recording through a capture session and finalize it
    Replay(ReplayArgs),

    /// Regenerate the Postman collection from a raw calls file
    Project(ProjectArgs),

    /// Print the performance summary of a raw calls file
    Summary(SummaryArgs),

    /// Print the origins captured for an environment
    Domains(ConfigArgs),
}

/// Config file and environment selection shared by session commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML capture config
    #[arg(long, env = OMS_CAPTURE_CONFIG)]
    pub config: Option<PathBuf>,

    /// Environment whose domains are captured
    #[arg(long = "env", env = OMS_ENV)]
    pub environment: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// HAR 1.2 recording
    pub har: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Capture every matched call (url) or only OMS commands (body)
    #[arg(long = "type", value_enum, default_value = "url")]
    pub capture_type: CaptureTypeArg,

    /// Output directory for the raw and Postman files
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Summary output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Raw calls file (api_calls_<type>.json)
    pub raw: PathBuf,

    /// Collection path; defaults to the standard name next to the raw file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Collection name; defaults to "OMS API Collection - <ENV> (<type>)"
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Raw calls file (api_calls_<type>.json)
    pub raw: PathBuf,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CaptureTypeArg {
    #[default]
    Url,
    Body,
}

impl From<CaptureTypeArg> for CaptureType {
    fn from(arg: CaptureTypeArg) -> Self {
        match arg {
            CaptureTypeArg::Url => CaptureType::Url,
            CaptureTypeArg::Body => CaptureType::Body,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
