// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Correlates scattered records into conversations.

use crate::parser::{Conversation, Message, Record};
use std::collections::HashMap;

/// Messages and metadata of an export, keyed by conversation id.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    order: Vec<String>,
    messages: HashMap<String, Vec<Message>>,
    conversations: HashMap<String, Conversation>,
}

/// One conversation that has at least one message.
#[derive(Debug, Clone, Copy)]
pub struct ConversationGroup<'a> {
    /// The conversation id.
    pub id: &'a str,
    /// Messages in export order.
    pub messages: &'a [Message],
    /// Metadata, or `None` if the export has no `conversations` record for `id`.
    pub metadata: Option<&'a Conversation>,
}

/// Groups the messages of all reply chains by conversation id.
///
/// Messages keep their export order; chains for the same conversation are
/// concatenated. Metadata is stripped of its transient fields, and a repeated
/// conversation id replaces the earlier metadata.
#[must_use]
pub fn group(records: Vec<Record>) -> Grouping {
    let mut grouping = Grouping::default();

    for record in records {
        match record {
            Record::ReplyChain(chain) => {
                for message in chain.messages {
                    grouping.push_message(message);
                }
            }
            Record::Conversation(mut conv) => {
                conv.strip_transient();
                grouping.conversations.insert(conv.id.clone(), *conv);
            }
            Record::Other(_) => {}
        }
    }

    grouping
}

impl Grouping {
    fn push_message(&mut self, message: Message) {
        if let Some(list) = self.messages.get_mut(&message.conversation_id) {
            list.push(message);
        } else {
            self.order.push(message.conversation_id.clone());
            self.messages
                .insert(message.conversation_id.clone(), vec![message]);
        }
    }

    /// Iterates over conversations with messages, in order of their first message.
    pub fn iter(&self) -> impl Iterator<Item = ConversationGroup<'_>> {
        self.order.iter().map(|id| ConversationGroup {
            id,
            messages: self.messages.get(id).map(Vec::as_slice).unwrap_or_default(),
            metadata: self.conversations.get(id),
        })
    }

    /// Messages of the conversation `id`, in export order.
    #[must_use]
    pub fn messages(&self, id: &str) -> &[Message] {
        self.messages.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Metadata of the conversation `id`.
    #[must_use]
    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    /// Number of conversations with at least one message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the export contains no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
