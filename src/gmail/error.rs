// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum GmailError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gmail API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: usize },
    #[error("Failed to decode Gmail response: {0}")]
    Decode(String),
}

impl GmailError {
    /// Errors that make every later call fail the same way.
    ///
    /// The batch loops stop on these instead of recording them per item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GmailError::Auth(_) | GmailError::Api { status: 401, .. })
    }
}
