// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bearer credential capability used by the Gmail client.

use async_trait::async_trait;
use chrono::Duration;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::AuthError;
use super::installed::authorize_interactive;
use super::oauth::GoogleOAuthClient;
use super::secrets::ClientSecrets;
use super::token::{AuthorizedUser, EXPIRY_MARGIN_SECONDS};
use crate::config::Settings;
use crate::logging::RunLog;

/// Produces a valid bearer credential, refreshing it when possible.
///
/// The workflow only depends on this; how the credential was first obtained
/// is up to the implementation.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Discard the current access token and obtain a new one.
    async fn force_refresh(&self) -> Result<String, AuthError>;
}

/// Credentials backed by `token.json`, rewritten after every refresh.
pub struct TokenFileProvider {
    path: PathBuf,
    oauth: GoogleOAuthClient,
    state: Mutex<AuthorizedUser>,
    run_log: Option<Arc<RunLog>>,
}

impl TokenFileProvider {
    pub fn new(path: impl Into<PathBuf>, oauth: GoogleOAuthClient, user: AuthorizedUser) -> Self {
        Self {
            path: path.into(),
            oauth,
            state: Mutex::new(user),
            run_log: None,
        }
    }

    /// Record refreshes in the run's audit log as well.
    pub fn with_run_log(mut self, run_log: Arc<RunLog>) -> Self {
        self.run_log = Some(run_log);
        self
    }

    /// Load stored credentials, falling back to the interactive flow when allowed.
    ///
    /// On success the provider already holds a valid access token, so an auth
    /// problem surfaces here rather than on the first API call.
    pub async fn bootstrap(
        settings: &Settings,
        interactive: bool,
        run_log: Arc<RunLog>,
    ) -> Result<Self, AuthError> {
        let oauth = GoogleOAuthClient::new(settings.request_timeout())?;
        let token_path = settings.token_path.clone();

        let stored = match AuthorizedUser::load(&token_path) {
            Ok(user) => Some(user),
            Err(AuthError::TokenMissing(_)) => None,
            Err(e) if interactive => {
                warn!("Ignoring unreadable token file {:?}: {}", token_path, e);
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(user) = stored {
            if !user.covers_scopes(&settings.scopes) {
                run_log.warn("Stored credentials do not cover the required scopes");
                if !interactive {
                    return Err(AuthError::ReauthorizationRequired);
                }
            } else {
                let provider = Self::new(&token_path, oauth, user).with_run_log(run_log.clone());
                match provider.access_token().await {
                    Ok(_) => {
                        run_log.info(format!("Loaded stored credentials from {}", token_path.display()));
                        return Ok(provider);
                    }
                    Err(e @ (AuthError::ReauthorizationRequired | AuthError::RefreshFailed(_)))
                        if interactive =>
                    {
                        run_log.warn(format!("Stored credentials unusable ({}); re-authorizing", e));
                    }
                    Err(e) => return Err(e),
                }
                return Self::authorize(settings, run_log).await;
            }
        } else if !interactive {
            return Err(AuthError::TokenMissing(token_path));
        }

        Self::authorize(settings, run_log).await
    }

    async fn authorize(settings: &Settings, run_log: Arc<RunLog>) -> Result<Self, AuthError> {
        let oauth = GoogleOAuthClient::new(settings.request_timeout())?;
        let secrets = ClientSecrets::load(&settings.client_secrets_path)?;
        let user = authorize_interactive(&oauth, &secrets, &settings.scopes).await?;
        user.save(&settings.token_path)?;
        run_log.info(format!(
            "Authorization complete; credentials saved to {}",
            settings.token_path.display()
        ));
        Ok(Self::new(&settings.token_path, oauth, user).with_run_log(run_log))
    }

    async fn refresh_locked(&self, user: &mut AuthorizedUser) -> Result<String, AuthError> {
        if !user.has_refresh_token() {
            return Err(AuthError::ReauthorizationRequired);
        }
        let response = self.oauth.refresh(user).await?;
        user.apply_token_response(response);
        user.save(&self.path)?;

        match &self.run_log {
            Some(run_log) => run_log.info("Access token refreshed"),
            None => info!("Access token refreshed"),
        }

        user.token
            .clone()
            .ok_or_else(|| AuthError::RefreshFailed("token endpoint returned no access token".to_string()))
    }
}

#[async_trait]
impl CredentialProvider for TokenFileProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut user = self.state.lock().await;
        if !user.is_expired(Duration::seconds(EXPIRY_MARGIN_SECONDS)) {
            if let Some(token) = &user.token {
                return Ok(token.clone());
            }
        }
        self.refresh_locked(&mut user).await
    }

    async fn force_refresh(&self) -> Result<String, AuthError> {
        let mut user = self.state.lock().await;
        self.refresh_locked(&mut user).await
    }
}
