// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;

use super::error::WorkflowError;
use crate::config::Settings;
use crate::gmail::{LabelChange, MessageStore};
use crate::logging::RunLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedItem>,
}

impl ApplySummary {
    /// Summary of a run over an empty work-list.
    pub fn nothing_to_do() -> Self {
        Self::default()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed_count())
    }
}

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub change: LabelChange,
    /// Log each id without calling the API.
    pub dry_run: bool,
    pub progress_interval: usize,
}

impl ApplyOptions {
    /// Remove `UNREAD` from every message.
    pub fn mark_read(settings: &Settings, dry_run: bool) -> Self {
        Self {
            change: LabelChange::mark_read(),
            dry_run,
            progress_interval: settings.progress_interval,
        }
    }
}

/// Apply `options.change` to each id in order, one call per id.
///
/// A failed item is recorded and the loop moves on. A fatal error stops the
/// run; the partial summary is logged before the error is returned.
pub async fn apply_label_change<S>(
    store: &S,
    ids: &[String],
    options: &ApplyOptions,
    run_log: &RunLog,
) -> Result<ApplySummary, WorkflowError>
where
    S: MessageStore + ?Sized,
{
    if ids.is_empty() {
        run_log.info("No message ids to process; nothing to do");
        return Ok(ApplySummary::nothing_to_do());
    }

    let total = ids.len();
    let interval = options.progress_interval.max(1);
    let mut summary = ApplySummary::default();
    run_log.info(format!(
        "Applying {} to {} message(s){}",
        options.change,
        total,
        if options.dry_run { " (dry run)" } else { "" }
    ));

    for id in ids {
        summary.attempted += 1;

        if options.dry_run {
            run_log.info(format!("Dry run: would apply {} to {}", options.change, id));
            summary.succeeded += 1;
            continue;
        }

        match store.modify_message_labels(id, &options.change).await {
            Ok(()) => {
                summary.succeeded += 1;
                run_log.info(format!("Applied {} to {}", options.change, id));
            }
            Err(e) if e.is_fatal() => {
                summary.attempted -= 1;
                run_log.error(format!(
                    "Run aborted at {} after {} of {} message(s) ({}): {}",
                    id, summary.attempted, total, summary, e
                ));
                return Err(WorkflowError::Aborted { processed: summary.attempted, total, source: e });
            }
            Err(e) => {
                run_log.error(format!("Failed to update {}: {}", id, e));
                summary.failed.push(FailedItem { id: id.clone(), reason: e.to_string() });
            }
        }

        if summary.attempted % interval == 0 {
            println!("Processed {}/{} messages", summary.attempted, total);
        }
    }

    run_log.info(format!("Run complete: {}", summary));
    Ok(summary)
}
