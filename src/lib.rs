// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Library core for mailmark.
//!
//! `mailmark-export` writes the unread messages of a Gmail account to a CSV
//! file; `mailmark-apply` reads that file back and marks each message read.

// --- Modules ---
pub mod auth;
pub mod cli;
pub mod config;
pub mod csvfile;
pub mod gmail;
pub mod logging;
pub mod workflow;

pub mod prelude {
    // Config
    pub use crate::config::Settings;
    pub use crate::logging::RunLog;

    // Credentials
    pub use crate::auth::{AuthError, CredentialProvider, TokenFileProvider};

    // Gmail
    pub use crate::gmail::{GmailClient, GmailError, LabelChange, MessageRef, MessageStore};

    // Workflows
    pub use crate::csvfile::{ExportWriter, MessageRecord};
    pub use crate::workflow::{
        apply_label_change, run_export, ApplyOptions, ApplySummary, ExportOptions, ExportSummary, WorkflowError,
    };

    // Common Libs
    pub use log::{debug, error, info, trace, warn};
    pub use std::sync::Arc;
}
