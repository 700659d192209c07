// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line arguments for the two binaries.

use clap::{Args, Parser};
use std::path::PathBuf;

use crate::config::Settings;

/// Process exit codes shared by both tools.
pub mod exit_code {
    /// Finished, or there was nothing to do.
    pub const SUCCESS: i32 = 0;
    /// Authentication, listing, configuration or file error.
    pub const FATAL: i32 = 1;
    /// Finished, but at least one message could not be updated.
    pub const PARTIAL_FAILURE: i32 = 2;
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// TOML configuration file
    #[arg(long, env = "MAILMARK_CONFIG")]
    pub config: Option<String>,

    /// Never open the interactive authorization flow; fail if the stored token is unusable
    #[arg(long)]
    pub no_browser: bool,
}

#[derive(Parser, Debug)]
#[command(name = "mailmark-export", version, about = "Export unread Gmail messages to CSV")]
pub struct ExportCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Gmail search query
    #[arg(long, short)]
    pub query: Option<String>,

    /// CSV file to create (overwritten if present)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Messages requested per listing page
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl ExportCli {
    /// Fold command-line overrides into loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(query) = &self.query {
            settings.query = query.clone();
        }
        if let Some(output) = &self.output {
            settings.csv_path = output.clone();
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size;
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mailmark-apply", version, about = "Mark the messages listed in a CSV export as read")]
pub struct ApplyCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// CSV file produced by mailmark-export
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Log what would change without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyCli {
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(input) = &self.input {
            settings.csv_path = input.clone();
        }
    }
}
