// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::{debug, info};
use std::collections::HashSet;

use super::error::WorkflowError;
use crate::gmail::{MessageRef, MessageStore};

/// Every message matching `query`, in the order the store returns them.
///
/// Pages are requested until one comes back without a continuation token.
/// Any failed page fails the whole listing, so an empty result always means
/// "no matches".
pub async fn list_all_messages<S>(store: &S, query: &str, page_size: u32) -> Result<Vec<MessageRef>, WorkflowError>
where
    S: MessageStore + ?Sized,
{
    if page_size == 0 {
        return Err(WorkflowError::InvalidPageSize);
    }

    let mut messages = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut page_token: Option<String> = None;
    let mut pages_fetched = 0usize;

    loop {
        let page = store
            .list_messages(query, page_token.clone(), page_size)
            .await
            .map_err(|source| WorkflowError::Listing { pages_fetched, source })?;
        pages_fetched += 1;
        debug!(
            "Page {}: {} message(s), next token {:?}",
            pages_fetched,
            page.messages.len(),
            page.next_page_token
        );
        messages.extend(page.messages);

        match page.next_page_token.filter(|t| !t.is_empty()) {
            None => break,
            Some(token) => {
                if !seen_tokens.insert(token.clone()) {
                    return Err(WorkflowError::PaginationStalled { token, pages_fetched });
                }
                page_token = Some(token);
            }
        }
    }

    info!(
        "Listed {} message(s) matching {:?} in {} page(s)",
        messages.len(),
        query,
        pages_fetched
    );
    Ok(messages)
}
