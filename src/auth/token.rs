// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Persisted OAuth2 credentials (`token.json`).
//!
//! The file uses Google's "authorized user" layout, so a token written by
//! Google's client libraries loads here and the other way round. It is
//! self-describing: the client id/secret and token endpoint needed for a
//! refresh live next to the tokens.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::AuthError;
use super::oauth::TokenResponse;
use super::secrets::ClientSecrets;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Seconds before the recorded expiry at which a token is already treated as expired.
pub const EXPIRY_MARGIN_SECONDS: i64 = 300;

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizedUser {
    /// Current access token, absent until the first refresh or exchange.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl AuthorizedUser {
    /// Build credentials from a completed authorization-code exchange.
    pub fn from_exchange(secrets: &ClientSecrets, response: TokenResponse, scopes: &[String]) -> Self {
        let mut user = Self {
            token: None,
            refresh_token: None,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes: scopes.to_vec(),
            expiry: None,
            universe_domain: Some("googleapis.com".to_string()),
            account: None,
        };
        user.apply_token_response(response);
        user
    }

    /// Load stored credentials from disk.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::TokenMissing(path.to_path_buf()));
        }
        debug!("Loading stored credentials from: {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        let user: AuthorizedUser = serde_json::from_str(&contents)?;
        Ok(user)
    }

    /// Persist credentials (atomic write, owner-only permissions).
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = std::fs::metadata(&temp_path)?.permissions();
            permissions.set_mode(0o600);
            std::fs::set_permissions(&temp_path, permissions)?;
        }

        std::fs::rename(&temp_path, path)?;
        info!("Saved credentials to {:?}", path);
        Ok(())
    }

    /// True when there is no access token, or it expires within `margin`.
    ///
    /// A token without a recorded expiry is taken at face value.
    pub fn is_expired(&self, margin: Duration) -> bool {
        match (&self.token, self.expiry) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(expiry)) => Utc::now() + margin >= expiry,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// True when every scope in `required` was granted to this token.
    pub fn covers_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Fold a token endpoint response into the stored credentials.
    ///
    /// Google omits `refresh_token` on refresh responses; the existing one is kept.
    pub fn apply_token_response(&mut self, response: TokenResponse) {
        self.token = Some(response.access_token);
        if let Some(refresh) = response.refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(refresh);
        }
        self.expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));
        if let Some(scope) = response.scope {
            let granted: Vec<String> = scope.split_whitespace().map(str::to_string).collect();
            if !granted.is_empty() {
                self.scopes = granted;
            }
        }
    }
}
