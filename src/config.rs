// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Runtime settings shared by the export and apply tools.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `MAILMARK_*` environment variables, then a few direct overrides.

use config::{Environment, File};
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_ID: &str = "me";
pub const DEFAULT_QUERY: &str = "is:unread";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CSV_PATH: &str = "emails.csv";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";
pub const DEFAULT_CLIENT_SECRETS_PATH: &str = "credentials.json";
pub const DEFAULT_API_BASE_URL: &str = "https://gmail.googleapis.com";
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    /// Audit log appended to by `mailmark-export`.
    pub export_file: PathBuf,
    /// Audit log appended to by `mailmark-apply`.
    pub apply_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub user_id: String,
    pub query: String,
    pub page_size: u32,
    pub csv_path: PathBuf,
    pub token_path: PathBuf,
    pub client_secrets_path: PathBuf,
    pub scopes: Vec<String>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: usize,
    pub progress_interval: usize,
    pub log: LogConfig,
}

impl Settings {
    /// Layer defaults, the optional file and the environment.
    ///
    /// Values are not checked here; callers apply their command-line
    /// overrides first and then call [`Settings::validate`].
    pub fn new(config_path: Option<&str>) -> Result<Self, SettingsError> {
        let mut config_builder = config::Config::builder()
            .set_default("user_id", DEFAULT_USER_ID)?
            .set_default("query", DEFAULT_QUERY)?
            .set_default("page_size", i64::from(DEFAULT_PAGE_SIZE))?
            .set_default("csv_path", DEFAULT_CSV_PATH)?
            .set_default("token_path", DEFAULT_TOKEN_PATH)?
            .set_default("client_secrets_path", DEFAULT_CLIENT_SECRETS_PATH)?
            .set_default("scopes", vec![GMAIL_MODIFY_SCOPE])?
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("request_timeout_secs", 30)?
            .set_default("max_retries", 4)?
            .set_default("progress_interval", 100)?
            // Log defaults
            .set_default("log.level", "info")?
            .set_default("log.export_file", "mailmark_export.log")?
            .set_default("log.apply_file", "mailmark_apply.log")?;

        if let Some(path) = config_path {
            config_builder = config_builder.add_source(File::with_name(path));
        }

        // e.g. `MAILMARK_PAGE_SIZE=50` overrides `page_size`,
        // `MAILMARK_LOG__LEVEL=debug` overrides `log.level`
        config_builder = config_builder.add_source(
            Environment::with_prefix("MAILMARK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scopes")
                .ignore_empty(true),
        );

        let env_vars = [("GMAIL_USER_ID", "user_id"), ("GMAIL_QUERY", "query")];
        for (env_var, config_key) in &env_vars {
            if let Ok(value) = env::var(env_var) {
                if value.trim().is_empty() {
                    warn!("Ignoring empty value in {}", env_var);
                    continue;
                }
                config_builder = config_builder.set_override(*config_key, value)?;
            }
        }

        let settings: Settings = config_builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Reject values that would make a run meaningless before any remote call.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.page_size == 0 {
            return Err(SettingsError::Invalid("page_size must be greater than zero".to_string()));
        }
        if self.progress_interval == 0 {
            return Err(SettingsError::Invalid(
                "progress_interval must be greater than zero".to_string(),
            ));
        }
        if self.query.trim().is_empty() {
            return Err(SettingsError::Invalid("query must not be empty".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(SettingsError::Invalid("user_id must not be empty".to_string()));
        }
        if self.scopes.is_empty() {
            return Err(SettingsError::Invalid("at least one OAuth scope is required".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            export_file: PathBuf::from("mailmark_export.log"),
            apply_file: PathBuf::from("mailmark_apply.log"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            query: DEFAULT_QUERY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            client_secrets_path: PathBuf::from(DEFAULT_CLIENT_SECRETS_PATH),
            scopes: vec![GMAIL_MODIFY_SCOPE.to_string()],
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            max_retries: 4,
            progress_interval: 100,
            log: LogConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load or parse configuration: {0}")]
    LoadError(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
