// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `oms-capture` command-line tool.

pub mod cli;
pub mod commands;
pub mod output;
