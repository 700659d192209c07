// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Google OAuth2 token endpoint client.
//!
//! Handles:
//! - Building authorization URLs with PKCE + state
//! - Exchanging authorization codes for tokens
//! - Refreshing expired access tokens

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine as _};
use log::{debug, error, info};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::error::AuthError;
use super::secrets::ClientSecrets;
use super::token::AuthorizedUser;

/// Token response from the Google OAuth2 token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// PKCE material for one authorization attempt.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let verifier = generate_code_verifier();
        let challenge = compute_code_challenge(&verifier);
        Self { verifier, challenge }
    }
}

pub struct GoogleOAuthClient {
    http_client: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(timeout: Duration) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }

    /// Build the consent URL the operator opens in a browser.
    pub fn authorization_url(
        secrets: &ClientSecrets,
        scopes: &[String],
        redirect_uri: &str,
        state: &str,
        pkce: &PkcePair,
    ) -> String {
        let scope = scopes.join(" ");
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
            secrets.auth_uri,
            urlencoding::encode(&secrets.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state),
            urlencoding::encode(&pkce.challenge),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let params = [
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("code_verifier", code_verifier),
        ];

        info!("Exchanging authorization code for tokens");

        let response = self
            .http_client
            .post(&secrets.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange failed: HTTP {} - {}", status, body);
            return Err(AuthError::TokenExchangeFailed(describe_failure(status, &body)));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(format!("JSON parse: {}", e)))?;

        info!("Successfully exchanged authorization code for tokens");
        Ok(token_response)
    }

    /// Refresh the access token held in `user`.
    pub async fn refresh(&self, user: &AuthorizedUser) -> Result<TokenResponse, AuthError> {
        let refresh_token = user
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::ReauthorizationRequired)?;

        let params = [
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        debug!("Refreshing Google OAuth2 access token");

        let response = self
            .http_client
            .post(&user.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token refresh failed: HTTP {} - {}", status, body);
            return Err(AuthError::RefreshFailed(describe_failure(status, &body)));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("JSON parse: {}", e)))?;

        info!("Successfully refreshed Google OAuth2 access token");
        Ok(token_response)
    }
}

fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GoogleErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("HTTP {}: {} - {}", status, err.error, description),
            None => format!("HTTP {}: {}", status, err.error),
        },
        Err(_) => format!("HTTP {}: {}", status, body),
    }
}

/// Generate a cryptographically random URL-safe string of the given byte length.
pub fn generate_random_string(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64URL.encode(&bytes)
}

/// Generate an OAuth2 PKCE code verifier (43-128 character URL-safe string).
fn generate_code_verifier() -> String {
    generate_random_string(32) // 32 bytes → 43 base64url characters
}

/// Compute the S256 code challenge from a code verifier.
fn compute_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    BASE64URL.encode(hash)
}
