// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Conversation types, titles, members and output file names.

use crate::entities::EntityIndex;
use crate::parser::Conversation;
use std::fmt;

/// The semantic type of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationKind {
    /// A scheduled meeting, titled by its topic.
    Meeting,
    /// A team space.
    Space,
    /// A channel thread.
    Topic,
    /// A one-to-one or group chat.
    Chat,
    /// Call-log container.
    Thread,
    /// Notification container (activity feed).
    Conversation,
    /// Messages whose conversation has no metadata record.
    Unknown,
    /// A type tag not known to this crate.
    Other(String),
}

impl ConversationKind {
    /// Maps an export type tag to a kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Meeting" => Self::Meeting,
            "Space" => Self::Space,
            "Topic" => Self::Topic,
            "Chat" => Self::Chat,
            "Thread" => Self::Thread,
            "Conversation" => Self::Conversation,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The type name used in headers, file names and the run summary.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Meeting => "Meeting",
            Self::Space => "Space",
            Self::Topic => "Topic",
            Self::Chat => "Chat",
            Self::Thread => "Thread",
            Self::Conversation => "Conversation",
            Self::Unknown => "Unknown",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the transcript header needs to know about a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The conversation kind.
    pub kind: ConversationKind,
    /// Title line of the transcript.
    pub title: Option<String>,
    /// File name base; the conversation id is used when `None`.
    pub file_base: Option<String>,
    /// Member display names; empty for kinds without fixed membership.
    pub members: Vec<String>,
}

/// Classifies a conversation. `None` metadata yields [`ConversationKind::Unknown`].
///
/// The members of a chat are listed without `local_user`, so both the
/// participant list and the file name show who the chat was with. A chat
/// with members is named after them, even when only `local_user` was left.
///
/// # Example
///
/// ```
/// use teams2txt::classifier::{classify, ConversationKind};
/// use teams2txt::entities::EntityIndex;
///
/// let class = classify(None, &EntityIndex::default(), Some("Alice"));
/// assert_eq!(class.kind, ConversationKind::Unknown);
/// assert!(class.members.is_empty());
/// ```
#[must_use]
pub fn classify(
    metadata: Option<&Conversation>,
    index: &EntityIndex,
    local_user: Option<&str>,
) -> Classification {
    let Some(conv) = metadata else {
        return Classification::untitled(ConversationKind::Unknown);
    };

    let kind = ConversationKind::from_tag(&conv.kind);
    let props = &conv.thread_properties;

    let (title, file_base, members) = match kind {
        ConversationKind::Meeting => {
            let topic = props.topic.clone();
            (topic.clone(), topic, member_names(conv, index))
        }
        ConversationKind::Space => {
            let topic = props.space_thread_topic.clone();
            (topic.clone(), topic, Vec::new())
        }
        ConversationKind::Topic => {
            let topic = props.topic_thread_topic.clone();
            (topic.clone(), topic, Vec::new())
        }
        ConversationKind::Chat => {
            let mut members = member_names(conv, index);
            let file_base = if members.is_empty() {
                None
            } else {
                if let Some(me) = local_user
                    && let Some(pos) = members.iter().position(|name| name == me)
                {
                    members.remove(pos);
                }
                Some(members.join(","))
            };
            (Some("Chat".to_owned()), file_base, members)
        }
        _ => (None, None, Vec::new()),
    };

    Classification {
        kind,
        title,
        file_base,
        members,
    }
}

fn member_names(conv: &Conversation, index: &EntityIndex) -> Vec<String> {
    conv.members
        .iter()
        .map(|member| {
            member
                .display_name()
                .unwrap_or_else(|| index.resolve(&member.id))
                .to_owned()
        })
        .collect()
}

impl Classification {
    fn untitled(kind: ConversationKind) -> Self {
        Self {
            kind,
            title: None,
            file_base: None,
            members: Vec::new(),
        }
    }

    /// Derives the transcript file name `{Kind}_{base}`.
    ///
    /// The base is [`Classification::file_base`], or `id` when there is none.
    /// Spaces become underscores and path separators are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use teams2txt::classifier::{Classification, ConversationKind};
    ///
    /// let class = Classification {
    ///     kind: ConversationKind::Chat,
    ///     title: Some("Chat".into()),
    ///     file_base: Some("Bob Jones".into()),
    ///     members: vec!["Bob Jones".into()],
    /// };
    /// assert_eq!(class.file_name("19:abc"), "Chat_Bob_Jones");
    /// ```
    #[must_use]
    pub fn file_name(&self, id: &str) -> String {
        let base = self.file_base.as_deref().unwrap_or(id);
        sanitize_file_name(&format!("{}_{base}", self.kind))
    }

    /// Width of the widest member name, ignoring unresolved `orgid` ids.
    #[must_use]
    pub fn sender_width(&self) -> usize {
        self.members
            .iter()
            .filter(|name| !name.contains("orgid"))
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}
