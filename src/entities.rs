// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Participant id to display name resolution.
//!
//! Teams messages mostly refer to people by opaque ids such as
//! `8:orgid:6a1f...`. The export only spells out names in a few places:
//! member name hints and the `lastMessage` snapshot of each conversation.
//! [`EntityIndex::build`] gathers all of them into one lookup table.

use crate::parser::Record;
use std::collections::HashMap;

/// Mapping from participant id to best-known display name.
///
/// Entries are added in record order and later entries replace earlier ones.
/// Lookups never fail: an unknown id resolves to itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIndex {
    names: HashMap<String, String>,
}

impl EntityIndex {
    /// Builds the index from every `conversations` record of an export.
    ///
    /// # Example
    ///
    /// ```
    /// use teams2txt::entities::EntityIndex;
    /// use teams2txt::parser::parse_export;
    ///
    /// let records = parse_export(r#"[{"store": "conversations", "value": {
    ///     "id": "19:c", "type": "Chat",
    ///     "members": [{"id": "8:orgid:a", "nameHint": {"displayName": "Alice"}}]
    /// }}]"#).unwrap();
    ///
    /// let index = EntityIndex::build(&records);
    /// assert_eq!(index.resolve("8:orgid:a"), "Alice");
    /// assert_eq!(index.resolve("8:orgid:z"), "8:orgid:z");
    /// ```
    #[must_use]
    pub fn build(records: &[Record]) -> Self {
        let mut index = Self::default();

        for record in records {
            let Record::Conversation(conv) = record else {
                continue;
            };

            for member in &conv.members {
                if let Some(name) = member.display_name() {
                    index.insert(&member.id, name);
                }
            }

            // Mostly needed to learn the local user's own name.
            if let Some((id, name)) = conv.last_sender()
                && !name.is_empty()
            {
                index.insert(id, name);
            }
        }

        index
    }

    /// Records `name` for `id`, replacing any earlier name.
    pub fn insert(&mut self, id: &str, name: &str) {
        self.names.insert(id.to_owned(), name.to_owned());
    }

    /// Returns the indexed name for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Returns the indexed name for `id`, or `id` itself when unknown.
    #[must_use]
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).unwrap_or(id)
    }

    /// Prefers an explicit non-empty `name`, otherwise resolves `id`.
    #[must_use]
    pub fn name_or_resolve<'a>(&'a self, name: Option<&'a str>, id: &'a str) -> &'a str {
        match name {
            Some(name) if !name.is_empty() => name,
            _ => self.resolve(id),
        }
    }

    /// Number of indexed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no names are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
