// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations.

use crate::cli::{Cli, Command, ConfigArgs, ProjectArgs, ReplayArgs, SummaryArgs};
use crate::output;
use anyhow::Context;
use oms_capture::{
    har, postman, store, CaptureConfig, CaptureSession, Clock, ClockHandle, DomainMatcher,
    FakeClock, Har, PerformanceSummary, RawCallFile,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Replay(args) => replay(args).await,
        Command::Project(args) => project(args).await,
        Command::Summary(args) => summary(args).await,
        Command::Domains(args) => domains(&args),
    }
}

/// Config file (or defaults), then `OMS_*` overrides for the `--env` environment.
pub fn load_config(args: &ConfigArgs) -> anyhow::Result<CaptureConfig> {
    let config = match &args.config {
        Some(path) => CaptureConfig::load(path)?,
        None => CaptureConfig::default(),
    };
    let config = config.apply_env_for(args.environment.as_deref());
    debug!(environment = %config.environment, "loaded capture config");
    Ok(config)
}

/// Standard collection path beside a raw calls file.
pub fn default_collection_path(raw_path: &Path, raw: &RawCallFile) -> PathBuf {
    let dir = raw_path.parent().unwrap_or_else(|| Path::new(""));
    CaptureConfig::default()
        .with_environment(raw.metadata.environment.clone())
        .with_output_dir(dir)
        .postman_file_path(raw.metadata.capture_type)
}

async fn replay(args: ReplayArgs) -> anyhow::Result<()> {
    let har = Har::load(&args.har)?;
    let mut config = load_config(&args.config)?;
    if let Some(dir) = args.out_dir {
        config.output_dir = dir;
    }

    let start = match har.first_started_ms()? {
        Some(ms) => ms,
        None => ClockHandle::system().now_millis(),
    };
    let clock = FakeClock::new(start);
    let session = CaptureSession::builder(config, args.capture_type.into())
        .clock(ClockHandle::Fake(clock.clone()))
        .start()
        .await
        .context("failed to start capture session")?;

    session.add_step(&format!("replay {}", args.har.display()));
    let replayed = har::replay(&har, &session, &clock)?;
    let report = session.finalize().await?;

    let mut stdout = std::io::stdout().lock();
    output::write_replay(&mut stdout, &replayed, &report, args.format)?;
    stdout.flush()?;
    Ok(())
}

async fn project(args: ProjectArgs) -> anyhow::Result<()> {
    let raw = RawCallFile::read(&args.raw).await?;
    let name = args
        .name
        .unwrap_or_else(|| postman::collection_name(&raw));
    let out = args
        .out
        .unwrap_or_else(|| default_collection_path(&args.raw, &raw));

    let collection = postman::project(&raw, &name);
    store::write_json(&out, &collection).await?;
    println!("{} ({} items)", out.display(), collection.item.len());
    Ok(())
}

async fn summary(args: SummaryArgs) -> anyhow::Result<()> {
    let raw = RawCallFile::read(&args.raw).await?;
    let summary = PerformanceSummary::from_calls(&raw.api_calls);

    let mut stdout = std::io::stdout().lock();
    output::write_summary(&mut stdout, &raw, &summary, args.format)?;
    stdout.flush()?;
    Ok(())
}

fn domains(args: &ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let matcher = DomainMatcher::new(config.base_urls()?);

    let mut stdout = std::io::stdout().lock();
    output::write_domains(&mut stdout, &config.environment, matcher.origins())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
