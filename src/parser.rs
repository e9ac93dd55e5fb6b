// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON parsing for Teams chat exports.
//!
//! An export is a single JSON array of "store" records. Each record names the
//! store it was dumped from and carries that store's value:
//!
//! - `replychains` records hold a `messageMap` of message id to message
//! - `conversations` records hold the metadata of one conversation
//!
//! Every other store is kept as an inert [`Record::Other`].
//!
//! # Example
//!
//! ```
//! use teams2txt::parser::{parse_export, Record};
//!
//! let json = r#"[
//!     {"store": "conversations", "value": {"id": "19:abc", "type": "Chat", "members": []}},
//!     {"store": "replychains", "value": {"messageMap": {
//!         "1": {
//!             "messageType": "Text",
//!             "conversationId": "19:abc",
//!             "originalArrivalTime": 1733356800000,
//!             "imDisplayName": "Alice",
//!             "content": "Hello"
//!         }
//!     }}},
//!     {"store": "people", "value": {}}
//! ]"#;
//!
//! let records = parse_export(json).unwrap();
//! assert_eq!(records.len(), 3);
//! assert!(matches!(records[2], Record::Other(ref store) if store == "people"));
//! ```

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use snafu::prelude::*;
use std::fmt;

/// Error type for JSON parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// Failed to parse JSON content.
    #[snafu(display("failed to parse JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },
}

/// One top-level entry of an export, discriminated by its `store` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A batch of messages from the `replychains` store.
    ReplyChain(ReplyChain),
    /// Conversation metadata from the `conversations` store.
    Conversation(Box<Conversation>),
    /// Any other store. Only the tag is kept.
    Other(String),
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut value = Value::deserialize(deserializer)?;

        let store = get_str(&value, &["store"]).unwrap_or_default().to_owned();
        let inner = value.get_mut("value").map(Value::take).unwrap_or_default();

        match store.as_str() {
            "replychains" => serde_json::from_value(inner)
                .map(Self::ReplyChain)
                .map_err(de::Error::custom),
            "conversations" => serde_json::from_value(inner)
                .map(|conversation| Self::Conversation(Box::new(conversation)))
                .map_err(de::Error::custom),
            _ => Ok(Self::Other(store)),
        }
    }
}

/// A batch of messages, in the order they appear in the export's `messageMap`.
///
/// A conversation's messages may be spread over several reply chains.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplyChain {
    /// The messages of this chain. Map keys (message ids) are dropped.
    #[serde(rename = "messageMap", default, deserialize_with = "ordered_messages")]
    pub messages: Vec<Message>,
}

/// A single message from a reply chain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The message type tag, e.g. `Text`, `RichText/Html`, `Event/Call` or
    /// `ThreadActivity/AddMember`.
    pub message_type: String,

    /// Id of the conversation this message belongs to.
    pub conversation_id: String,

    /// Arrival time in milliseconds since the Unix epoch.
    #[serde(deserialize_with = "epoch_millis_field")]
    pub original_arrival_time: i64,

    /// Identifier of the sender.
    #[serde(default)]
    pub from: Option<String>,

    /// Display name of the sender as recorded on the message itself.
    #[serde(default)]
    pub im_display_name: Option<String>,

    /// Message payload. Its format depends on [`Message::message_type`];
    /// `None` for deleted messages.
    #[serde(default)]
    pub content: Option<String>,

    /// Free-form, type-dependent properties.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Message {
    /// Returns the property stored under `key`, if any.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(key)
    }
}

/// Metadata of one conversation from the `conversations` store.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// Stable conversation id, referenced by [`Message::conversation_id`].
    pub id: String,

    /// The conversation type tag (`Chat`, `Meeting`, `Space`, ...).
    pub kind: String,

    /// Conversation members, in export order.
    pub members: Vec<Member>,

    /// Type-specific topic fields.
    pub thread_properties: ThreadProperties,

    /// The `lastMessage` snapshot. Only used to learn display names; removed
    /// by [`Conversation::strip_transient`].
    pub last_message: Option<Value>,

    /// The complete JSON object as exported, used for debug dumps.
    pub raw: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationFields {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    members: Option<Vec<Member>>,
    #[serde(default)]
    thread_properties: Option<ThreadProperties>,
    #[serde(default)]
    last_message: Option<Value>,
}

impl<'de> Deserialize<'de> for Conversation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let fields = ConversationFields::deserialize(&raw).map_err(de::Error::custom)?;

        Ok(Self {
            id: fields.id,
            kind: fields.kind,
            members: fields.members.unwrap_or_default(),
            thread_properties: fields.thread_properties.unwrap_or_default(),
            last_message: fields.last_message.filter(|v| !v.is_null()),
            raw,
        })
    }
}

impl Conversation {
    /// Sender id and display name of the `lastMessage` snapshot.
    ///
    /// Returns `None` unless `lastMessage` is an object carrying both `from`
    /// and `imdisplayname`. A leading `worker/` is stripped from the id.
    #[must_use]
    pub fn last_sender(&self) -> Option<(&str, &str)> {
        let last = self.last_message.as_ref()?;
        let from = get_str(last, &["from"])?;
        let name = get_str(last, &["imdisplayname"])?;
        Some((from.strip_prefix("worker/").unwrap_or(from), name))
    }

    /// Drops the `lastMessage` snapshot and `properties.quickReplyAugmentation`.
    pub fn strip_transient(&mut self) {
        self.last_message = None;

        if let Some(obj) = self.raw.as_object_mut() {
            obj.shift_remove("lastMessage");
            if let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) {
                props.shift_remove("quickReplyAugmentation");
            }
        }
    }
}

/// A member of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Participant identifier.
    pub id: String,

    /// Embedded display-name annotation.
    #[serde(default)]
    pub name_hint: Option<NameHint>,
}

impl Member {
    /// The display name from the member's name hint, if present.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name_hint.as_ref()?.display_name.as_deref()
    }
}

/// Display-name annotation of a [`Member`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameHint {
    /// The member's display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Topic fields of a conversation. Which one is set depends on the type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadProperties {
    /// Meeting topic.
    #[serde(default)]
    pub topic: Option<String>,

    /// Topic of a team space.
    #[serde(default)]
    pub space_thread_topic: Option<String>,

    /// Topic of a channel thread.
    #[serde(default)]
    pub topic_thread_topic: Option<String>,
}

/// Reads epoch milliseconds from a JSON number or numeric string.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use teams2txt::parser::epoch_millis;
///
/// assert_eq!(epoch_millis(&json!(1733356800000_i64)), Some(1_733_356_800_000));
/// assert_eq!(epoch_millis(&json!("1733356800000")), Some(1_733_356_800_000));
/// assert_eq!(epoch_millis(&json!(null)), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn epoch_millis_field<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    epoch_millis(&value)
        .ok_or_else(|| de::Error::custom(format!("invalid epoch milliseconds: {value}")))
}

/// Collects the values of a `messageMap` object, keeping document order.
fn ordered_messages<'de, D>(deserializer: D) -> Result<Vec<Message>, D::Error>
where
    D: Deserializer<'de>,
{
    struct MessageMapVisitor;

    impl<'de> Visitor<'de> for MessageMapVisitor {
        type Value = Vec<Message>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of message ids to messages")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut messages = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((IgnoredAny, message)) = map.next_entry::<IgnoredAny, Message>()? {
                messages.push(message);
            }
            Ok(messages)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(MessageMapVisitor)
}

/// Navigates a JSON path and returns the string value at the end.
pub(crate) fn get_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str()
}

/// Parses a Teams export into its records.
///
/// # Errors
///
/// Returns an error if the input is not a JSON array of records, or if a
/// `replychains` or `conversations` record doesn't match the expected schema.
pub fn parse_export(json_str: &str) -> Result<Vec<Record>, ParseError> {
    serde_json::from_str(json_str).context(JsonSnafu)
}
