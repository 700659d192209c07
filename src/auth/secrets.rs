// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Registered application credentials (`credentials.json`).
//!
//! Only needed for the one-time interactive authorization; refreshes use the
//! copy of the client id/secret stored in the token file.

use serde::Deserialize;
use std::path::Path;

use super::error::AuthError;
use super::token::GOOGLE_TOKEN_URI;

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<SecretsEntry>,
    web: Option<SecretsEntry>,
}

#[derive(Debug, Deserialize)]
struct SecretsEntry {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::SecretsMissing(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, AuthError> {
        let file: SecretsFile = serde_json::from_str(contents)?;
        // Desktop ("installed") clients are the expected kind; "web" works with a loopback redirect too.
        let entry = file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidSecrets("expected an \"installed\" or \"web\" client entry".to_string())
        })?;

        if entry.client_id.trim().is_empty() {
            return Err(AuthError::InvalidSecrets("client_id is empty".to_string()));
        }

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            auth_uri: entry.auth_uri.unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
            token_uri: entry.token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
        })
    }
}
