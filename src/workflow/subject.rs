// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::warn;

use crate::gmail::{GmailError, MessageStore};

pub const NO_SUBJECT: &str = "(No Subject)";
pub const SUBJECT_ERROR: &str = "(Error Fetching Subject)";

/// Outcome of a best-effort subject lookup.
#[derive(Debug)]
pub enum SubjectLookup {
    Found(String),
    Missing,
    Failed(GmailError),
}

impl SubjectLookup {
    /// The value written to the export file.
    pub fn display_value(&self) -> &str {
        match self {
            SubjectLookup::Found(subject) => subject,
            SubjectLookup::Missing => NO_SUBJECT,
            SubjectLookup::Failed(_) => SUBJECT_ERROR,
        }
    }
}

/// Fetch `Subject` for one message with a metadata-only request.
///
/// Fatal errors are returned as `Err` so the caller can stop the run; every
/// other failure becomes `SubjectLookup::Failed`.
pub async fn fetch_subject<S>(store: &S, id: &str) -> Result<SubjectLookup, GmailError>
where
    S: MessageStore + ?Sized,
{
    match store.get_message_metadata(id).await {
        Ok(metadata) => Ok(match metadata.header("Subject") {
            Some(subject) => SubjectLookup::Found(subject.to_string()),
            None => SubjectLookup::Missing,
        }),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Could not fetch subject for {}: {}", id, e);
            Ok(SubjectLookup::Failed(e))
        }
    }
}
