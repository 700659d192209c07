// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mark every message listed in a `mailmark-export` CSV as read.
//!
//! Usage:
//!   mailmark-apply                     # reads emails.csv
//!   mailmark-apply --input out.csv
//!   mailmark-apply --dry-run           # authenticate and log, change nothing
//!
//! Exit codes:
//!   0 - Success, or nothing to do
//!   1 - Error (authentication, unreadable file, aborted run)
//!   2 - Finished, but some messages could not be updated
//!
//! Safe to re-run: removing a label that is already gone is a no-op.

use clap::Parser;
use log::{error, warn};
use std::sync::Arc;

use mailmark::auth::TokenFileProvider;
use mailmark::cli::{exit_code, ApplyCli};
use mailmark::config::Settings;
use mailmark::csvfile::load_message_ids;
use mailmark::gmail::GmailClient;
use mailmark::logging::{self, RunLog};
use mailmark::workflow::{apply_label_change, ApplyOptions};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = ApplyCli::parse();
    std::process::exit(run(cli).await);
}

async fn run(cli: ApplyCli) -> i32 {
    let mut settings = match Settings::new(cli.common.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            logging::init_diagnostics("info");
            error!("{}", e);
            return exit_code::FATAL;
        }
    };
    cli.apply_overrides(&mut settings);
    logging::init_diagnostics(&settings.log.level);
    if let Err(e) = settings.validate() {
        error!("{}", e);
        return exit_code::FATAL;
    }

    let run_log = match RunLog::open(&settings.log.apply_file) {
        Ok(run_log) => Arc::new(run_log),
        Err(e) => {
            warn!("Cannot open {:?} ({}); continuing without a run log", settings.log.apply_file, e);
            Arc::new(RunLog::disabled())
        }
    };
    run_log.info(format!("Apply started (pid: {})", std::process::id()));

    let ids = match load_message_ids(&settings.csv_path) {
        Ok(ids) => ids,
        Err(e) => {
            run_log.error(format!("Cannot read work-list: {}", e));
            eprintln!("Cannot read work-list: {}", e);
            return exit_code::FATAL;
        }
    };
    run_log.info(format!("Loaded {} message id(s) from {}", ids.len(), settings.csv_path.display()));

    if ids.is_empty() {
        run_log.info("Nothing to do");
        println!("No message ids in {}; nothing to do.", settings.csv_path.display());
        return exit_code::SUCCESS;
    }

    let credentials = match TokenFileProvider::bootstrap(&settings, !cli.common.no_browser, run_log.clone()).await {
        Ok(credentials) => credentials,
        Err(e) => {
            run_log.error(format!("Authentication failed: {}", e));
            eprintln!("Authentication failed: {}", e);
            eprintln!(
                "Re-run without --no-browser to authorize, or delete {} if it is stale.",
                settings.token_path.display()
            );
            return exit_code::FATAL;
        }
    };

    let client = match GmailClient::from_settings(&settings, Arc::new(credentials)) {
        Ok(client) => client,
        Err(e) => {
            run_log.error(format!("Failed to build Gmail client: {}", e));
            return exit_code::FATAL;
        }
    };

    let options = ApplyOptions::mark_read(&settings, cli.dry_run);
    let code = match apply_label_change(&client, &ids, &options, &run_log).await {
        Ok(summary) if cli.dry_run => {
            println!("Dry run: {} message(s) would be marked as read.", summary.attempted);
            exit_code::SUCCESS
        }
        Ok(summary) => {
            println!("Marked messages as read: {}", summary);
            for item in &summary.failed {
                println!("  {}: {}", item.id, item.reason);
            }
            if summary.has_failures() {
                exit_code::PARTIAL_FAILURE
            } else {
                exit_code::SUCCESS
            }
        }
        Err(e) => {
            run_log.error(format!("Apply failed: {}", e));
            eprintln!("Apply failed: {}", e);
            exit_code::FATAL
        }
    };

    if let Some(path) = run_log.path() {
        println!("Run log: {}", path.display());
    }
    code
}
