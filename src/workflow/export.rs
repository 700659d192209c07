// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;
use std::io::Write;

use super::error::WorkflowError;
use super::lister::list_all_messages;
use super::subject::{fetch_subject, SubjectLookup};
use crate::config::Settings;
use crate::csvfile::{ExportWriter, MessageRecord};
use crate::gmail::MessageStore;
use crate::logging::RunLog;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub query: String,
    pub page_size: u32,
    /// Report progress every this many rows.
    pub progress_interval: usize,
}

impl ExportOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            query: settings.query.clone(),
            page_size: settings.page_size,
            progress_interval: settings.progress_interval,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub listed: usize,
    pub written: usize,
    pub subject_missing: usize,
    pub subject_failed: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listed, {} written ({} without subject, {} subject lookups failed)",
            self.listed, self.written, self.subject_missing, self.subject_failed
        )
    }
}

/// List matching messages and write one `id,subject` row for each.
///
/// `open_output` is only called once the listing has succeeded, so a failed
/// listing never touches an earlier export. A run with no matches leaves a
/// header-only file. A fatal error stops the run after flushing the rows
/// written so far.
pub async fn run_export<S, W, F>(
    store: &S,
    open_output: F,
    options: &ExportOptions,
    run_log: &RunLog,
) -> Result<ExportSummary, WorkflowError>
where
    S: MessageStore + ?Sized,
    W: Write,
    F: FnOnce() -> Result<ExportWriter<W>, WorkflowError>,
{
    run_log.info(format!("Listing messages matching {:?}", options.query));
    let refs = list_all_messages(store, &options.query, options.page_size).await?;
    let mut writer = open_output()?;

    let mut summary = ExportSummary { listed: refs.len(), ..Default::default() };
    if refs.is_empty() {
        run_log.info("No messages matched; nothing to export");
        writer.flush()?;
        return Ok(summary);
    }
    run_log.info(format!("Found {} message(s); fetching subjects", refs.len()));

    let total = refs.len();
    let interval = options.progress_interval.max(1);
    for message in &refs {
        let lookup = match fetch_subject(store, &message.id).await {
            Ok(lookup) => lookup,
            Err(source) => {
                writer.flush()?;
                let processed = writer.rows_written();
                run_log.error(format!(
                    "Export aborted after {} of {} message(s): {}",
                    processed, total, source
                ));
                return Err(WorkflowError::Aborted { processed, total, source });
            }
        };

        match &lookup {
            SubjectLookup::Found(_) => {}
            SubjectLookup::Missing => summary.subject_missing += 1,
            SubjectLookup::Failed(e) => {
                summary.subject_failed += 1;
                run_log.warn(format!("Subject lookup failed for {}: {}", message.id, e));
            }
        }

        writer.write_record(&MessageRecord::new(message.id.as_str(), lookup.display_value()))?;
        summary.written = writer.rows_written();

        if summary.written % interval == 0 {
            println!("Processed {}/{} messages", summary.written, total);
            run_log.info(format!("Processed {}/{} messages", summary.written, total));
        }
    }

    writer.flush()?;
    run_log.info(format!("Export complete: {}", summary));
    Ok(summary)
}
