// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::csvfile::IN_MEMORY;
use crate::gmail::GmailError;

/// Run-level failures of the export and apply workflows.
///
/// Per-item failures never show up here; they are counted in the run summaries.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Listing messages failed after {pages_fetched} page(s): {source}")]
    Listing {
        pages_fetched: usize,
        #[source]
        source: GmailError,
    },
    #[error("Pagination stalled: token {token:?} returned again after {pages_fetched} page(s)")]
    PaginationStalled { token: String, pages_fetched: usize },
    #[error("Page size must be greater than zero")]
    InvalidPageSize,
    #[error("Run aborted after {processed} of {total} item(s): {source}")]
    Aborted {
        processed: usize,
        total: usize,
        #[source]
        source: GmailError,
    },
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkflowError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        WorkflowError::Io { path: path.to_path_buf(), source }
    }

    pub fn csv(path: Option<&Path>, source: csv::Error) -> Self {
        WorkflowError::Csv {
            path: path.map_or_else(|| PathBuf::from(IN_MEMORY), Path::to_path_buf),
            source,
        }
    }
}
