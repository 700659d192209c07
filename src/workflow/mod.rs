// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The export and apply workflows, written against `MessageStore` only.

pub mod apply;
pub mod error;
pub mod export;
pub mod lister;
pub mod subject;

pub use apply::{apply_label_change, ApplyOptions, ApplySummary, FailedItem};
pub use error::WorkflowError;
pub use export::{run_export, ExportOptions, ExportSummary};
pub use lister::list_all_messages;
pub use subject::{fetch_subject, SubjectLookup, NO_SUBJECT, SUBJECT_ERROR};
