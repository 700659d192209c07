// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gmail v1 REST client.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[cfg(test)]
use mockall::automock;

use super::error::GmailError;
use super::types::{ErrorEnvelope, LabelChange, MessageMetadata, MessagePage};
use crate::auth::CredentialProvider;
use crate::config::Settings;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(32);

/// The remote message store, seen through the three calls the tools make.
///
/// The mailbox owner is fixed when the store is built, so calls only name messages.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// One page of ids matching `query`. `page_token` is `None` for the first page.
    async fn list_messages(
        &self,
        query: &str,
        page_token: Option<String>,
        max_results: u32,
    ) -> Result<MessagePage, GmailError>;

    /// Headers only (`format=metadata`), restricted to `Subject`.
    async fn get_message_metadata(&self, id: &str) -> Result<MessageMetadata, GmailError>;

    async fn modify_message_labels(&self, id: &str, change: &LabelChange) -> Result<(), GmailError>;
}

pub struct GmailClient {
    http: reqwest::Client,
    messages_url: String,
    credentials: Arc<dyn CredentialProvider>,
    max_retries: usize,
    initial_backoff: Duration,
}

impl GmailClient {
    pub fn new(
        api_base_url: &str,
        user_id: &str,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self, GmailError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let messages_url = format!(
            "{}/gmail/v1/users/{}/messages",
            api_base_url.trim_end_matches('/'),
            urlencoding::encode(user_id)
        );
        Ok(Self {
            http,
            messages_url,
            credentials,
            max_retries,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    pub fn from_settings(settings: &Settings, credentials: Arc<dyn CredentialProvider>) -> Result<Self, GmailError> {
        Self::new(
            &settings.api_base_url,
            &settings.user_id,
            credentials,
            settings.request_timeout(),
            settings.max_retries,
        )
    }

    /// Starting delay between retries; doubles per attempt up to 32s.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn message_url(&self, id: &str) -> String {
        format!("{}/{}", self.messages_url, urlencoding::encode(id))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&LabelChange>,
    ) -> Result<T, GmailError> {
        let text = self.execute(method, url, query, body).await?;
        serde_json::from_str(&text).map_err(|e| GmailError::Decode(e.to_string()))
    }

    /// Send one request, retrying throttling and server errors with backoff.
    ///
    /// A 401 triggers one forced credential refresh before it is reported.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&LabelChange>,
    ) -> Result<String, GmailError> {
        let mut token = self.credentials.access_token().await?;
        let mut refreshed = false;
        let mut backoff = self.initial_backoff;
        let mut attempt = 0usize;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url)
                .bearer_auth(&token)
                .header(ACCEPT, "application/json")
                .query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    warn!("{} {} failed ({}); retrying in {:?}", method, url, e, backoff);
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !refreshed {
                warn!("Access token rejected by Gmail; forcing a refresh");
                token = self.credentials.force_refresh().await?;
                refreshed = true;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if attempt < self.max_retries {
                    let wait = retry_after(response.headers()).unwrap_or(backoff);
                    warn!("{} {} returned HTTP {}; retrying in {:?}", method, url, status, wait);
                    sleep(wait).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    attempt += 1;
                    continue;
                }
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(GmailError::RateLimited { attempts: attempt + 1 });
                }
            }

            let text = response.text().await?;
            if !status.is_success() {
                return Err(api_error(status, &text));
            }
            debug!("{} {} -> HTTP {}", method, url, status);
            return Ok(text);
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn api_error(status: StatusCode, body: &str) -> GmailError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(kind) if !envelope.error.message.is_empty() => format!("{} ({})", envelope.error.message, kind),
            Some(kind) => kind,
            None => envelope.error.message,
        },
        Err(_) => body.chars().take(200).collect(),
    };
    GmailError::Api { status: status.as_u16(), message }
}

#[async_trait]
impl MessageStore for GmailClient {
    async fn list_messages(
        &self,
        query: &str,
        page_token: Option<String>,
        max_results: u32,
    ) -> Result<MessagePage, GmailError> {
        let mut params = vec![("q", query.to_string()), ("maxResults", max_results.to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.call(Method::GET, &self.messages_url, &params, None).await
    }

    async fn get_message_metadata(&self, id: &str) -> Result<MessageMetadata, GmailError> {
        let params = [("format", "metadata".to_string()), ("metadataHeaders", "Subject".to_string())];
        self.call(Method::GET, &self.message_url(id), &params, None).await
    }

    async fn modify_message_labels(&self, id: &str, change: &LabelChange) -> Result<(), GmailError> {
        let url = format!("{}/modify", self.message_url(id));
        self.execute(Method::POST, &url, &[], Some(change)).await?;
        Ok(())
    }
}
