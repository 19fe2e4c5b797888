// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `oms-capture` binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use oms_capture_cli::cli::Cli;
use oms_capture_cli::commands;
use oms_capture_cli::output::print_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::run(cli).await {
        print_error(format!("{e:#}"));
        std::process::exit(1);
    }
}
