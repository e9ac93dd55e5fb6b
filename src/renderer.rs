// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Rendering of single messages into transcript lines.
//!
//! Every message becomes at most one line. Activity and event messages have
//! no sender column:
//!
//! ```text
//! 2024-12-05 10:00:00 ThreadActivity/MemberJoined -- Alice,Bob
//! ```
//!
//! Conversational messages name their sender in angle brackets. In chats and
//! meetings the sender column is padded to the widest member name:
//!
//! ```text
//! 2024-12-05 10:00:00 Text <Bob>   Hello
//! 2024-12-05 10:01:00 Html <Alice> **hi**
//! ```
//!
//! Which function renders a message is decided by a [`Registry`], keyed by
//! conversation kind and message type prefix.
//!
//! # Example
//!
//! ```
//! use teams2txt::classifier::ConversationKind;
//! use teams2txt::entities::EntityIndex;
//! use teams2txt::parser::Message;
//! use teams2txt::renderer::{Registry, RenderContext};
//!
//! let message = Message {
//!     message_type: "Text".into(),
//!     conversation_id: "19:abc".into(),
//!     original_arrival_time: 1_733_392_800_000,
//!     from: Some("8:orgid:b".into()),
//!     im_display_name: Some("Bob".into()),
//!     content: Some("Hello\n".into()),
//!     properties: None,
//! };
//! let index = EntityIndex::default();
//! let ctx = RenderContext {
//!     index: &index,
//!     kind: &ConversationKind::Chat,
//!     sender_width: 5,
//! };
//!
//! let line = Registry::default().render(&message, &ctx).unwrap().unwrap();
//! assert_eq!(line.to_string(), "2024-12-05 10:00:00 Text <Bob>   Hello");
//! ```

use crate::classifier::ConversationKind;
use crate::entities::EntityIndex;
use crate::html;
use crate::parser::{Message, epoch_millis};
use crate::payload::{self, PayloadError};
use chrono::DateTime;
use snafu::prelude::*;
use std::fmt;

/// Error type for message rendering failures.
#[derive(Debug, Snafu)]
pub enum RenderError {
    /// An embedded activity, call or call-log payload could not be decoded.
    #[snafu(display("{message_type} message in {conversation_id}: {source}"))]
    Payload {
        /// Conversation of the offending message.
        conversation_id: String,
        /// Type of the offending message.
        message_type: String,
        /// The decoding error.
        source: PayloadError,
    },

    /// A message has neither content nor a deletion time.
    #[snafu(display(
        "{message_type} message in {conversation_id} at {timestamp} has no content"
    ))]
    MissingContent {
        /// Conversation of the offending message.
        conversation_id: String,
        /// Type of the offending message.
        message_type: String,
        /// Arrival time of the offending message.
        timestamp: String,
    },

    /// Rich-text content could not be converted to plain text.
    #[snafu(display("failed to convert HTML message in {conversation_id}: {source}"))]
    Html {
        /// Conversation of the offending message.
        conversation_id: String,
        /// The conversion error.
        source: html2text::Error,
    },
}

/// Everything a handler may consult besides the message itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Participant names.
    pub index: &'a EntityIndex,
    /// Kind of the conversation the message belongs to.
    pub kind: &'a ConversationKind,
    /// Width of the widest member name, for aligning the sender column.
    pub sender_width: usize,
}

/// One rendered transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Arrival time, `YYYY-MM-DD HH:MM:SS` in UTC.
    pub timestamp: String,
    /// Message type as shown in the transcript.
    pub message_type: String,
    /// Formatted sender column, or `None` for activity and event lines.
    pub sender: Option<String>,
    /// Single-line message text.
    pub text: String,
}

impl RenderedLine {
    fn event(message: &Message, text: &str) -> Self {
        Self {
            timestamp: format_timestamp(message.original_arrival_time),
            message_type: message.message_type.clone(),
            sender: None,
            text: single_line(text),
        }
    }

    fn said(message: &Message, message_type: String, sender: String, text: &str) -> Self {
        Self {
            timestamp: format_timestamp(message.original_arrival_time),
            message_type,
            sender: Some(sender),
            text: single_line(text),
        }
    }
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.timestamp,
            self.message_type,
            self.sender.as_deref().unwrap_or("--"),
            self.text
        )
    }
}

/// A message handler. `Ok(None)` means the message produces no line.
pub type Handler =
    fn(&Message, &RenderContext<'_>) -> Result<Option<RenderedLine>, RenderError>;

#[derive(Debug, Clone)]
struct Route {
    kind: Option<ConversationKind>,
    prefix: Option<String>,
    handler: Handler,
}

/// Handlers keyed by conversation kind and message type prefix.
///
/// A message is rendered by the first route found among, in this order:
///
/// 1. its conversation kind and its type prefix
/// 2. any kind and its type prefix
/// 3. its conversation kind and any prefix
/// 4. any kind and any prefix
///
/// The prefix of `ThreadActivity/AddMember` is `ThreadActivity`. The default
/// registry routes:
///
/// | Kind | Prefix | Handler |
/// |---|---|---|
/// | any | `ThreadActivity` | [`render_thread_activity`] |
/// | any | `Event` | [`render_event`] |
/// | `Conversation` | any | [`render_notification`] |
/// | `Thread` | any | [`render_call_log`] |
/// | any | any | [`render_chat_message`] |
#[derive(Debug, Clone)]
pub struct Registry {
    routes: Vec<Route>,
}

impl Registry {
    /// A registry without routes. It renders nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// Routes messages of `kind` with type `prefix` to `handler`; `None`
    /// matches anything. Replaces an existing route with the same key.
    pub fn register(
        &mut self,
        kind: Option<ConversationKind>,
        prefix: Option<&str>,
        handler: Handler,
    ) -> &mut Self {
        let prefix = prefix.map(str::to_owned);

        if let Some(route) = self
            .routes
            .iter_mut()
            .find(|r| r.kind == kind && r.prefix == prefix)
        {
            route.handler = handler;
        } else {
            self.routes.push(Route {
                kind,
                prefix,
                handler,
            });
        }
        self
    }

    /// Looks up the handler for a message type in a conversation of `kind`.
    #[must_use]
    pub fn handler_for(&self, kind: &ConversationKind, message_type: &str) -> Option<Handler> {
        let prefix = message_type.split_once('/').map(|(prefix, _)| prefix);
        let keys = [
            (Some(kind), prefix),
            (None, prefix),
            (Some(kind), None),
            (None, None),
        ];

        keys.iter().find_map(|(k, p)| {
            self.routes
                .iter()
                .find(|r| r.kind.as_ref() == *k && r.prefix.as_deref() == *p)
                .map(|r| r.handler)
        })
    }

    /// Renders one message with the matching handler.
    ///
    /// # Errors
    ///
    /// Returns the handler's error; see [`RenderError`].
    pub fn render(
        &self,
        message: &Message,
        ctx: &RenderContext<'_>,
    ) -> Result<Option<RenderedLine>, RenderError> {
        match self.handler_for(ctx.kind, &message.message_type) {
            Some(handler) => handler(message, ctx),
            None => Ok(None),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(None, Some("ThreadActivity"), render_thread_activity)
            .register(None, Some("Event"), render_event)
            .register(Some(ConversationKind::Conversation), None, render_notification)
            .register(Some(ConversationKind::Thread), None, render_call_log)
            .register(None, None, render_chat_message);
        registry
    }
}

fn payload_context(message: &Message) -> PayloadSnafu<&str, &str> {
    PayloadSnafu {
        conversation_id: message.conversation_id.as_str(),
        message_type: message.message_type.as_str(),
    }
}

/// Renders membership activity as the comma-joined names of the members involved.
///
/// Added members that the index doesn't know show as their raw `<id>` element.
/// Other activity types keep their raw content.
///
/// # Errors
///
/// Returns an error if the XML or JSON payload is malformed.
pub fn render_thread_activity(
    message: &Message,
    ctx: &RenderContext<'_>,
) -> Result<Option<RenderedLine>, RenderError> {
    let content = message.content.as_deref().unwrap_or_default();

    let names: Vec<String> = match message.message_type.as_str() {
        "ThreadActivity/AddMember" => payload::decode_add_member(content)
            .context(payload_context(message))?
            .iter()
            .map(|id| {
                ctx.index
                    .get(id)
                    .map_or_else(|| format!("<id>{id}</id>"), str::to_owned)
            })
            .collect(),
        "ThreadActivity/MemberJoined" | "ThreadActivity/MemberLeft" => {
            payload::decode_membership(content)
                .context(payload_context(message))?
                .iter()
                .map(|id| ctx.index.resolve(id).to_owned())
                .collect()
        }
        _ => Vec::new(),
    };

    let text = if names.is_empty() {
        content.to_owned()
    } else {
        names.join(",")
    };
    Ok(Some(RenderedLine::event(message, &text)))
}

/// Renders `Event/Call` as the list of call participants; other events keep
/// their raw content.
///
/// # Errors
///
/// Returns an error if the participant XML of a call is malformed.
pub fn render_event(
    message: &Message,
    _ctx: &RenderContext<'_>,
) -> Result<Option<RenderedLine>, RenderError> {
    let content = message.content.as_deref().unwrap_or_default();

    if message.message_type != "Event/Call" {
        return Ok(Some(RenderedLine::event(message, content)));
    }

    let call = payload::decode_call(content).context(payload_context(message))?;
    let text = if call.participants.is_empty() {
        call.body
    } else {
        let ended = if call.ended { "Call ENDED: " } else { "" };
        format!("{ended}Parted: {}", call.participants.join(","))
    };
    Ok(Some(RenderedLine::event(message, &text)))
}

/// Renders an activity-feed notification: who did it, and a preview of what,
/// prefixed with the source thread's topic when known.
///
/// # Errors
///
/// Returns an error if an embedded `activity` document is malformed.
pub fn render_notification(
    message: &Message,
    ctx: &RenderContext<'_>,
) -> Result<Option<RenderedLine>, RenderError> {
    let note = match &message.properties {
        Some(props) => payload::decode_notification(props).context(payload_context(message))?,
        None => payload::Notification::default(),
    };

    let id = note
        .sender_id
        .as_deref()
        .or(message.from.as_deref())
        .unwrap_or_default();
    let name = ctx.index.name_or_resolve(note.sender_name.as_deref(), id);

    let preview = note
        .preview
        .as_deref()
        .or(message.content.as_deref())
        .unwrap_or_default();
    let text = match &note.thread_topic {
        Some(topic) => format!("[{topic}] {preview}"),
        None => preview.to_owned(),
    };

    Ok(Some(RenderedLine::said(
        message,
        message.message_type.clone(),
        format!("<{name}>"),
        &text,
    )))
}

/// Renders the `call-log` property of a message in a call-log thread.
///
/// Messages without a call log produce no line.
///
/// # Errors
///
/// Returns an error if the call log is malformed.
pub fn render_call_log(
    message: &Message,
    ctx: &RenderContext<'_>,
) -> Result<Option<RenderedLine>, RenderError> {
    let Some(raw) = message.property("call-log") else {
        return Ok(None);
    };
    let log = payload::decode_call_log(raw).context(payload_context(message))?;
    let index = ctx.index;

    let caller = &log.originator_participant;
    let caller_name = index.name_or_resolve(caller.display_name.as_deref(), &caller.id);

    let mut text = match &log.target_participant {
        Some(target) => format!(
            "call to {}",
            index.name_or_resolve(target.display_name.as_deref(), &target.id)
        ),
        None => "called".to_owned(),
    };

    if let Some(participants) = &log.participants {
        let mut others: Vec<&str> = participants.iter().map(String::as_str).collect();
        remove_first(&mut others, &caller.id);
        if let Some(target) = &log.target_participant {
            remove_first(&mut others, &target.id);
        }
        if !others.is_empty() {
            let names: Vec<&str> = others.iter().map(|id| index.resolve(id)).collect();
            text.push_str(" + ");
            text.push_str(&names.join(","));
        }
    }

    if let Some(end) = &log.end_time {
        text.push_str(" - End: ");
        text.push_str(end);
    }

    Ok(Some(RenderedLine::said(
        message,
        message.message_type.clone(),
        format!("<{caller_name}>"),
        &text,
    )))
}

fn remove_first(ids: &mut Vec<&str>, id: &str) {
    if let Some(pos) = ids.iter().position(|other| *other == id) {
        ids.remove(pos);
    }
}

/// Renders an ordinary chat, meeting, space or topic message.
///
/// The sender is the name recorded on the message. Deleted messages show
/// their deletion time, and rich HTML is flattened to text and shown with
/// the type `Html`.
///
/// # Errors
///
/// Returns an error if the message has no content and no deletion time, or
/// if its HTML can't be converted.
pub fn render_chat_message(
    message: &Message,
    ctx: &RenderContext<'_>,
) -> Result<Option<RenderedLine>, RenderError> {
    let name = message
        .im_display_name
        .as_deref()
        .or(message.from.as_deref())
        .unwrap_or_default();
    let sender = format!("{:<width$}", format!("<{name}>"), width = ctx.sender_width + 2);

    let is_html = message.message_type == "RichText/Html";
    let message_type = if is_html {
        "Html".to_owned()
    } else {
        message.message_type.clone()
    };

    let text = match message.content.as_deref() {
        Some(content) if is_html => html::to_text(content).context(HtmlSnafu {
            conversation_id: message.conversation_id.as_str(),
        })?,
        Some(content) => content.to_owned(),
        None => {
            let deleted = message
                .property("deletetime")
                .and_then(epoch_millis)
                .with_context(|| MissingContentSnafu {
                    conversation_id: message.conversation_id.as_str(),
                    message_type: message.message_type.as_str(),
                    timestamp: format_timestamp(message.original_arrival_time),
                })?;
            format!("<deleted @{}>", format_timestamp(deleted))
        }
    };

    Ok(Some(RenderedLine::said(message, message_type, sender, &text)))
}

/// Formats epoch milliseconds as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Out-of-range values are shown as the raw number.
#[must_use]
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Trims surrounding newlines and escapes the rest as literal `\n`.
fn single_line(text: &str) -> String {
    text.trim_matches('\n').replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    // 2024-12-05 10:00:00 UTC
    const T0: i64 = 1_733_392_800_000;

    fn message(message_type: &str, content: Option<&str>) -> Message {
        Message {
            message_type: message_type.into(),
            conversation_id: "19:conv".into(),
            original_arrival_time: T0,
            from: Some("8:orgid:bob".into()),
            im_display_name: Some("Bob".into()),
            content: content.map(str::to_owned),
            properties: None,
        }
    }

    fn with_properties(mut msg: Message, props: Value) -> Message {
        msg.properties = props.as_object().cloned();
        msg
    }

    fn index() -> EntityIndex {
        let mut index = EntityIndex::default();
        index.insert("x", "Xavier");
        index.insert("8:orgid:alice", "Alice");
        index.insert("8:orgid:bob", "Bob");
        index
    }

    fn render(msg: &Message, kind: &ConversationKind, width: usize) -> Option<RenderedLine> {
        let index = index();
        let ctx = RenderContext {
            index: &index,
            kind,
            sender_width: width,
        };
        Registry::default().render(msg, &ctx).unwrap()
    }

    fn render_err(msg: &Message, kind: &ConversationKind) -> RenderError {
        let index = index();
        let ctx = RenderContext {
            index: &index,
            kind,
            sender_width: 0,
        };
        Registry::default().render(msg, &ctx).unwrap_err()
    }

    #[test]
    fn renders_plain_chat_message_with_padding() {
        let line = render(&message("Text", Some("Hi\nthere\n")), &ConversationKind::Chat, 5).unwrap();

        assert_eq!(line.sender.as_deref(), Some("<Bob>  "));
        assert_eq!(line.text, "Hi\\nthere");
        assert_eq!(line.to_string(), "2024-12-05 10:00:00 Text <Bob>   Hi\\nthere");
    }

    #[test]
    fn relabels_rich_html() {
        let line = render(
            &message("RichText/Html", Some("<b>hi</b>")),
            &ConversationKind::Chat,
            0,
        )
        .unwrap();

        assert_eq!(line.message_type, "Html");
        assert_eq!(line.text, "**hi**");
    }

    #[test]
    fn html_images_become_alt_text() {
        let line = render(
            &message(
                "RichText/Html",
                Some(r#"<p>look <img alt="smile" src="https://example.com/e.png"> ok</p>"#),
            ),
            &ConversationKind::Meeting,
            0,
        )
        .unwrap();

        assert_eq!(line.text, "look smile ok");
    }

    #[test]
    fn html_links_stay_inline() {
        let line = render(
            &message(
                "RichText/Html",
                Some(r#"<p>see <a href="https://e.com/x">link</a></p>"#),
            ),
            &ConversationKind::Chat,
            0,
        )
        .unwrap();

        assert_eq!(line.text, "see [link](https://e.com/x)");
    }

    #[test]
    fn long_html_is_not_wrapped() {
        let words = "word ".repeat(100);
        let line = render(
            &message("RichText/Html", Some(&format!("<p>{words}</p>"))),
            &ConversationKind::Chat,
            0,
        )
        .unwrap();

        assert!(!line.text.contains("\\n"), "{}", line.text);
    }

    #[test]
    fn renders_deleted_message() {
        let msg = with_properties(
            message("Text", None),
            json!({"deletetime": "1733396400000"}),
        );
        let line = render(&msg, &ConversationKind::Chat, 0).unwrap();

        assert_eq!(line.text, "<deleted @2024-12-05 11:00:00>");
    }

    #[test]
    fn missing_content_without_deletion_is_fatal() {
        let msg = with_properties(message("Text", None), json!({"edittime": "1"}));
        let err = render_err(&msg, &ConversationKind::Chat);

        assert!(matches!(err, RenderError::MissingContent { .. }));
        assert!(err.to_string().contains("19:conv"));
    }

    #[test]
    fn chat_sender_falls_back_to_raw_id() {
        let mut msg = message("Text", Some("hey"));
        msg.im_display_name = None;
        let line = render(&msg, &ConversationKind::Chat, 0).unwrap();

        // Chat senders never go through the index.
        assert_eq!(line.sender.as_deref(), Some("<8:orgid:bob>"));
    }

    #[test]
    fn member_joined_resolves_names() {
        let msg = message(
            "ThreadActivity/MemberJoined",
            Some(r#"{"members":[{"id":"x"}]}"#),
        );
        let line = render(&msg, &ConversationKind::Chat, 9).unwrap();

        assert_eq!(line.text, "Xavier");
        assert_eq!(line.sender, None);
        assert_eq!(
            line.to_string(),
            "2024-12-05 10:00:00 ThreadActivity/MemberJoined -- Xavier"
        );
    }

    #[test]
    fn member_left_keeps_unknown_ids() {
        let msg = message(
            "ThreadActivity/MemberLeft",
            Some(r#"{"members":[{"id":"x"},{"id":"8:orgid:zed"}]}"#),
        );
        let line = render(&msg, &ConversationKind::Meeting, 0).unwrap();

        assert_eq!(line.text, "Xavier,8:orgid:zed");
    }

    #[test]
    fn add_member_falls_back_to_id_fragment() {
        let msg = message(
            "ThreadActivity/AddMember",
            Some(concat!(
                "<addmember><eventtime>1</eventtime><initiator>8:orgid:bob</initiator>",
                "<target>8:orgid:alice</target>",
                "<detailedtargetinfo><id>8:orgid:alice</id></detailedtargetinfo>",
                "<target>8:orgid:new</target>",
                "<detailedtargetinfo><id>8:orgid:new</id></detailedtargetinfo>",
                "</addmember>",
            )),
        );
        let line = render(&msg, &ConversationKind::Space, 0).unwrap();

        assert_eq!(line.text, "Alice,<id>8:orgid:new</id>");
    }

    #[test]
    fn other_activity_keeps_raw_content() {
        let msg = message(
            "ThreadActivity/TopicUpdate",
            Some("<topicupdate><value>New</value></topicupdate>"),
        );
        let line = render(&msg, &ConversationKind::Chat, 0).unwrap();

        assert_eq!(line.text, "<topicupdate><value>New</value></topicupdate>");
    }

    #[test]
    fn malformed_activity_payload_is_fatal() {
        let msg = message("ThreadActivity/MemberJoined", Some("{not json"));
        let err = render_err(&msg, &ConversationKind::Chat);

        assert!(matches!(err, RenderError::Payload { .. }));
    }

    #[test]
    fn renders_ended_call() {
        let msg = message(
            "Event/Call",
            Some("<ended/><partlist><part><displayName>Smith, John</displayName></part></partlist>"),
        );
        let line = render(&msg, &ConversationKind::Chat, 0).unwrap();

        assert!(line.text.starts_with("Call ENDED: Parted: John Smith"));
        assert_eq!(line.sender, None);
    }

    #[test]
    fn renders_started_call_participants() {
        let msg = message(
            "Event/Call",
            Some("<partlist><part><name>a</name></part><part><displayName>B</displayName></part></partlist>"),
        );
        let line = render(&msg, &ConversationKind::Meeting, 0).unwrap();

        assert_eq!(line.text, "Parted: a,B");
    }

    #[test]
    fn malformed_call_is_fatal() {
        let msg = message("Event/Call", Some("<ended/><partlist><part>"));
        let err = render_err(&msg, &ConversationKind::Chat);

        assert!(matches!(err, RenderError::Payload { .. }));
    }

    #[test]
    fn event_prefix_wins_over_thread_kind() {
        let msg = message("Event/Call", Some("<partlist><part><name>a</name></part></partlist>"));
        let line = render(&msg, &ConversationKind::Thread, 0).unwrap();

        assert_eq!(line.text, "Parted: a");
    }

    #[test]
    fn renders_notification_with_topic() {
        let msg = with_properties(
            message("Text", Some("ignored")),
            json!({"activity": {
                "sourceUserId": "8:orgid:alice",
                "messagePreview": "deploy done\n",
                "sourceThreadTopic": "Ops"
            }}),
        );
        let line = render(&msg, &ConversationKind::Conversation, 20).unwrap();

        assert_eq!(line.sender.as_deref(), Some("<Alice>"));
        assert_eq!(line.text, "[Ops] deploy done");
    }

    #[test]
    fn notification_prefers_explicit_name() {
        let msg = with_properties(
            message("Text", None),
            json!({"sourceUserId": "8:orgid:alice", "sourceUserImDisplayName": "Alice W.", "messagePreview": "a\nb"}),
        );
        let line = render(&msg, &ConversationKind::Conversation, 0).unwrap();

        assert_eq!(line.sender.as_deref(), Some("<Alice W.>"));
        assert_eq!(line.text, "a\\nb");
    }

    #[test]
    fn renders_call_log() {
        let log = json!({
            "originatorParticipant": {"id": "8:orgid:alice"},
            "targetParticipant": {"id": "8:orgid:bob", "displayName": "Bobby"},
            "participants": ["8:orgid:alice", "8:orgid:bob", "x"],
            "endTime": "2024-12-05T10:30:00Z"
        });
        let msg = with_properties(
            message("Text", None),
            json!({"call-log": log.to_string()}),
        );
        let line = render(&msg, &ConversationKind::Thread, 0).unwrap();

        assert_eq!(line.sender.as_deref(), Some("<Alice>"));
        assert_eq!(line.text, "call to Bobby + Xavier - End: 2024-12-05T10:30:00Z");
    }

    #[test]
    fn call_log_without_target_says_called() {
        let log = json!({
            "originatorParticipant": {"id": "8:orgid:alice", "displayName": "Alice A."},
            "targetParticipant": null,
            "participants": ["8:orgid:alice"],
            "endTime": "t"
        });
        let msg = with_properties(message("Text", None), json!({"call-log": log.to_string()}));
        let line = render(&msg, &ConversationKind::Thread, 0).unwrap();

        assert_eq!(line.to_string(), "2024-12-05 10:00:00 Text <Alice A.> called - End: t");
    }

    #[test]
    fn thread_messages_without_call_log_are_skipped() {
        let msg = message("Text", Some("noise"));
        assert_eq!(render(&msg, &ConversationKind::Thread, 0), None);
    }

    #[test]
    fn malformed_call_log_is_fatal() {
        let msg = with_properties(message("Text", None), json!({"call-log": "{oops"}));
        let err = render_err(&msg, &ConversationKind::Thread);

        assert!(matches!(err, RenderError::Payload { .. }));
    }

    #[test]
    fn registry_prefers_specific_routes() {
        fn shout(msg: &Message, _: &RenderContext<'_>) -> Result<Option<RenderedLine>, RenderError> {
            Ok(Some(RenderedLine::event(msg, "SHOUT")))
        }

        let mut registry = Registry::default();
        registry.register(Some(ConversationKind::Meeting), Some("Event"), shout);

        let index = EntityIndex::default();
        let msg = message("Event/Call", Some("<partlist/>"));
        let in_meeting = RenderContext {
            index: &index,
            kind: &ConversationKind::Meeting,
            sender_width: 0,
        };
        let in_chat = RenderContext {
            kind: &ConversationKind::Chat,
            ..in_meeting
        };

        assert_eq!(registry.render(&msg, &in_meeting).unwrap().unwrap().text, "SHOUT");
        assert_ne!(registry.render(&msg, &in_chat).unwrap().unwrap().text, "SHOUT");
    }

    #[test]
    fn empty_registry_renders_nothing() {
        let index = EntityIndex::default();
        let ctx = RenderContext {
            index: &index,
            kind: &ConversationKind::Chat,
            sender_width: 0,
        };
        let msg = message("Text", Some("hi"));

        assert!(Registry::empty().handler_for(ctx.kind, "Text").is_none());
        assert_eq!(Registry::empty().render(&msg, &ctx).unwrap(), None);
    }

    #[test]
    fn formats_timestamps_in_utc() {
        assert_eq!(format_timestamp(T0), "2024-12-05 10:00:00");
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }
}
