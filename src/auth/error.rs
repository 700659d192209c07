// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from credential loading, refresh and authorization.
///
/// Every variant is run-fatal: the tools stop before any further remote call.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No stored token at {}; run without --no-browser to authorize", .0.display())]
    TokenMissing(PathBuf),
    #[error("Client secrets not found at {}", .0.display())]
    SecretsMissing(PathBuf),
    #[error("Invalid client secrets: {0}")]
    InvalidSecrets(String),
    #[error("Access token expired and no refresh token is available; re-run authorization")]
    ReauthorizationRequired,
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),
    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),
    #[error("Invalid state parameter in authorization callback")]
    InvalidState,
    #[error("Malformed authorization callback: {0}")]
    InvalidCallback(String),
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
