// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! In-memory mailbox implementing `MessageStore` for workflow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use mailmark::auth::AuthError;
use mailmark::gmail::{GmailError, Header, LabelChange, MessageMetadata, MessagePage, MessageRef, MessageStore, UNREAD};

#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub id: String,
    pub subject: Option<String>,
    pub labels: BTreeSet<String>,
}

pub struct FakeStore {
    messages: Mutex<Vec<FakeMessage>>,
    pub list_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub modify_calls: Mutex<Vec<String>>,
    failing_metadata: HashSet<String>,
    failing_modify: HashSet<String>,
    revoked_at_modify: Option<String>,
    listing_unavailable: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            modify_calls: Mutex::new(Vec::new()),
            failing_metadata: HashSet::new(),
            failing_modify: HashSet::new(),
            revoked_at_modify: None,
            listing_unavailable: false,
        }
    }

    /// `count` unread messages `msg-1..=msg-count`, subject `Subject n`.
    pub fn with_unread(count: usize) -> Self {
        let store = Self::new();
        for n in 1..=count {
            store.add(&format!("msg-{n}"), Some(&format!("Subject {n}")), true);
        }
        store
    }

    pub fn add(&self, id: &str, subject: Option<&str>, unread: bool) {
        let mut labels = BTreeSet::from(["INBOX".to_string()]);
        if unread {
            labels.insert(UNREAD.to_string());
        }
        self.messages.lock().unwrap().push(FakeMessage {
            id: id.to_string(),
            subject: subject.map(str::to_string),
            labels,
        });
    }

    pub fn fail_metadata_for(mut self, id: &str) -> Self {
        self.failing_metadata.insert(id.to_string());
        self
    }

    pub fn fail_modify_for(mut self, id: &str) -> Self {
        self.failing_modify.insert(id.to_string());
        self
    }

    /// Every call from `id` onwards fails as if the grant were revoked.
    pub fn revoke_at(mut self, id: &str) -> Self {
        self.revoked_at_modify = Some(id.to_string());
        self
    }

    /// Every list call fails with a backend error.
    pub fn fail_listing(mut self) -> Self {
        self.listing_unavailable = true;
        self
    }

    pub fn is_unread(&self, id: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.id == id && m.labels.contains(UNREAD))
    }

    pub fn unread_count(&self) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.labels.contains(UNREAD))
            .count()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn modified_ids(&self) -> Vec<String> {
        self.modify_calls.lock().unwrap().clone()
    }
}

fn not_found(id: &str) -> GmailError {
    GmailError::Api { status: 404, message: format!("Requested entity was not found: {id}") }
}

#[async_trait]
impl MessageStore for FakeStore {
    async fn list_messages(
        &self,
        query: &str,
        page_token: Option<String>,
        max_results: u32,
    ) -> Result<MessagePage, GmailError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_unavailable {
            return Err(GmailError::Api { status: 503, message: "Backend Error".into() });
        }
        let offset = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("offset-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| GmailError::Api { status: 400, message: "Invalid pageToken".into() })?,
        };

        let unread_only = query.contains("is:unread");
        let matching: Vec<MessageRef> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| !unread_only || m.labels.contains(UNREAD))
            .map(|m| MessageRef::new(m.id.clone()))
            .collect();

        let end = (offset + max_results as usize).min(matching.len());
        let next_page_token = (end < matching.len()).then(|| format!("offset-{end}"));
        Ok(MessagePage {
            messages: matching[offset.min(end)..end].to_vec(),
            next_page_token,
            result_size_estimate: Some(matching.len() as u64),
        })
    }

    async fn get_message_metadata(&self, id: &str) -> Result<MessageMetadata, GmailError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_metadata.contains(id) {
            return Err(GmailError::Api { status: 500, message: "Backend Error".into() });
        }
        let messages = self.messages.lock().unwrap();
        let message = messages.iter().find(|m| m.id == id).ok_or_else(|| not_found(id))?;
        let mut headers = vec![Header { name: "From".into(), value: "sender@example.com".into() }];
        if let Some(subject) = &message.subject {
            headers.push(Header { name: "Subject".into(), value: subject.clone() });
        }
        Ok(MessageMetadata { id: id.to_string(), headers })
    }

    async fn modify_message_labels(&self, id: &str, change: &LabelChange) -> Result<(), GmailError> {
        self.modify_calls.lock().unwrap().push(id.to_string());
        if let Some(revoked) = &self.revoked_at_modify {
            let order: Vec<String> = self.messages.lock().unwrap().iter().map(|m| m.id.clone()).collect();
            let cutoff = order.iter().position(|m| m == revoked);
            let current = order.iter().position(|m| m == id);
            if let (Some(cutoff), Some(current)) = (cutoff, current) {
                if current >= cutoff {
                    return Err(GmailError::Auth(AuthError::RefreshFailed("invalid_grant".into())));
                }
            }
        }
        if self.failing_modify.contains(id) {
            return Err(GmailError::Api { status: 400, message: "Invalid id value".into() });
        }

        let mut messages = self.messages.lock().unwrap();
        let message = messages.iter_mut().find(|m| m.id == id).ok_or_else(|| not_found(id))?;
        for label in &change.remove_label_ids {
            message.labels.remove(label);
        }
        for label in &change.add_label_ids {
            message.labels.insert(label.clone());
        }
        Ok(())
    }
}
