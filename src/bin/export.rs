// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Export the messages matching a Gmail query to `Email ID,Subject` CSV.
//!
//! Usage:
//!   mailmark-export                               # is:unread -> emails.csv
//!   mailmark-export --query 'is:unread label:x'   # custom query
//!   mailmark-export --output out.csv --no-browser
//!
//! Exit codes:
//!   0 - Success (including no matches)
//!   1 - Error

use clap::Parser;
use log::{error, warn};
use std::sync::Arc;

use mailmark::auth::TokenFileProvider;
use mailmark::cli::{exit_code, ExportCli};
use mailmark::config::Settings;
use mailmark::csvfile::ExportWriter;
use mailmark::gmail::GmailClient;
use mailmark::logging::{self, RunLog};
use mailmark::workflow::{run_export, ExportOptions};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = ExportCli::parse();
    std::process::exit(run(cli).await);
}

async fn run(cli: ExportCli) -> i32 {
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

    let run_log = match RunLog::open(&settings.log.export_file) {
        Ok(run_log) => Arc::new(run_log),
        Err(e) => {
            warn!("Cannot open {:?} ({}); continuing without a run log", settings.log.export_file, e);
            Arc::new(RunLog::disabled())
        }
    };
    run_log.info(format!("Export started (pid: {})", std::process::id()));

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

    let options = ExportOptions::from_settings(&settings);
    let csv_path = settings.csv_path.clone();
    let code = match run_export(&client, || ExportWriter::create(&csv_path), &options, &run_log).await {
        Ok(summary) => {
            if summary.listed == 0 {
                println!("No messages matched {:?}.", settings.query);
            }
            println!(
                "Exported {} message(s) to {}: {}",
                summary.written,
                settings.csv_path.display(),
                summary
            );
            exit_code::SUCCESS
        }
        Err(e) => {
            run_log.error(format!("Export failed: {}", e));
            eprintln!("Export failed: {}", e);
            exit_code::FATAL
        }
    };

    if let Some(path) = run_log.path() {
        println!("Run log: {}", path.display());
    }
    code
}
