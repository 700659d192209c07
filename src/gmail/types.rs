// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wire shapes for the subset of Gmail v1 the tools use.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// System label carried by unread messages.
pub const UNREAD: &str = "UNREAD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl MessageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), thread_id: None }
    }
}

/// One page of `users.messages.list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Omitted by the API when the page is empty.
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    /// `None` once the listing is exhausted; an empty string is read as `None`.
    #[serde(default, deserialize_with = "non_empty_token")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_size_estimate: Option<u64>,
}

fn non_empty_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let token: Option<String> = Option::deserialize(deserializer)?;
    Ok(token.filter(|t| !t.is_empty()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Result of a `format=metadata` fetch, reduced to its headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageMetadata {
    pub id: String,
    pub headers: Vec<Header>,
}

impl MessageMetadata {
    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    #[serde(default)]
    payload: Option<RawPayload>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    headers: Vec<Header>,
}

impl<'de> Deserialize<'de> for MessageMetadata {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawMessage::deserialize(deserializer)?;
        Ok(MessageMetadata {
            id: raw.id,
            headers: raw.payload.map(|p| p.headers).unwrap_or_default(),
        })
    }
}

/// Body of `users.messages.modify`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelChange {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_label_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_label_ids: Vec<String>,
}

impl LabelChange {
    pub fn remove(label: &str) -> Self {
        Self {
            add_label_ids: Vec::new(),
            remove_label_ids: vec![label.to_string()],
        }
    }

    /// The change that marks a message as read.
    pub fn mark_read() -> Self {
        Self::remove(UNREAD)
    }
}

/// Renders as `+ADDED -REMOVED`, e.g. `-UNREAD`.
impl fmt::Display for LabelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let added = self.add_label_ids.iter().map(|l| format!("+{l}"));
        let removed = self.remove_label_ids.iter().map(|l| format!("-{l}"));
        let parts: Vec<String> = added.chain(removed).collect();
        f.write_str(&parts.join(" "))
    }
}

/// Google's JSON error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
