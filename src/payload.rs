// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Decoding of payloads embedded in message strings.
//!
//! Several message types carry a second serialization format inside a string
//! field: membership changes as XML or JSON, call events as XML and call logs
//! as JSON. Each is decoded once into a typed structure here, so the renderer
//! never looks at the raw text again.
//!
//! | Message | Field | Format | Decoder |
//! |---|---|---|---|
//! | `ThreadActivity/AddMember` | content | XML | [`decode_add_member`] |
//! | `ThreadActivity/MemberJoined`, `MemberLeft` | content | JSON | [`decode_membership`] |
//! | `Event/Call` | content | `<ended/>`? + XML | [`decode_call`] |
//! | any, in call-log threads | `properties.call-log` | JSON | [`decode_call_log`] |
//! | any, in notification feeds | `properties[.activity]` | JSON | [`decode_notification`] |

use serde::Deserialize;
use serde_json::{Map, Value};
use snafu::prelude::*;

/// Marker prepended to the content of a finished call.
const ENDED_MARKER: &str = "<ended/>";

/// Error type for embedded payload decoding.
#[derive(Debug, Snafu)]
pub enum PayloadError {
    /// The embedded XML is malformed or doesn't match the expected layout.
    #[snafu(display("malformed XML payload {payload:?}: {source}"))]
    Xml {
        /// The offending payload.
        payload: String,
        /// The underlying XML error.
        source: quick_xml::de::DeError,
    },

    /// The embedded JSON is malformed or doesn't match the expected layout.
    #[snafu(display("malformed JSON payload {payload}: {source}"))]
    Json {
        /// The offending payload.
        payload: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct AddMemberXml {
    #[serde(default, rename = "detailedtargetinfo")]
    targets: Vec<TargetInfoXml>,
}

#[derive(Deserialize)]
struct TargetInfoXml {
    #[serde(default)]
    id: Option<String>,
}

/// Decodes the ids of the members added by a `ThreadActivity/AddMember` message.
///
/// # Errors
///
/// Returns an error if `xml` is not well-formed.
///
/// # Example
///
/// ```
/// use teams2txt::payload::decode_add_member;
///
/// let xml = "<addmember><eventtime>1</eventtime><initiator>8:orgid:a</initiator>\
///            <target>8:orgid:b</target>\
///            <detailedtargetinfo><id>8:orgid:b</id><friendlyName>B</friendlyName></detailedtargetinfo>\
///            </addmember>";
/// assert_eq!(decode_add_member(xml).unwrap(), ["8:orgid:b"]);
/// ```
pub fn decode_add_member(xml: &str) -> Result<Vec<String>, PayloadError> {
    let parsed: AddMemberXml = quick_xml::de::from_str(xml).context(XmlSnafu { payload: xml })?;

    Ok(parsed
        .targets
        .into_iter()
        .filter_map(|target| target.id)
        .collect())
}

#[derive(Deserialize)]
struct MembershipJson {
    #[serde(default)]
    members: Vec<MemberRefJson>,
}

#[derive(Deserialize)]
struct MemberRefJson {
    id: String,
}

/// Decodes the member ids of a `ThreadActivity/MemberJoined` or `MemberLeft` message.
///
/// # Errors
///
/// Returns an error if `json` is malformed or a member lacks an id.
pub fn decode_membership(json: &str) -> Result<Vec<String>, PayloadError> {
    let parsed: MembershipJson =
        serde_json::from_str(json).context(JsonSnafu { payload: json })?;

    Ok(parsed.members.into_iter().map(|m| m.id).collect())
}

/// A decoded `Event/Call` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEvent {
    /// Whether the call has ended.
    pub ended: bool,
    /// Participant names, normalized to "First Last".
    pub participants: Vec<String>,
    /// The XML part of the content, without the ended marker.
    pub body: String,
}

#[derive(Deserialize)]
struct PartListXml {
    #[serde(default, rename = "part")]
    parts: Vec<PartXml>,
}

#[derive(Deserialize)]
struct PartXml {
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Decodes the content of an `Event/Call` message.
///
/// # Errors
///
/// Returns an error if the participant list is not well-formed XML.
///
/// # Example
///
/// ```
/// use teams2txt::payload::decode_call;
///
/// let call = decode_call(
///     "<ended/><partlist><part><displayName>Smith, John</displayName></part></partlist>",
/// ).unwrap();
/// assert!(call.ended);
/// assert_eq!(call.participants, ["John Smith"]);
/// ```
pub fn decode_call(content: &str) -> Result<CallEvent, PayloadError> {
    let (ended, body) = content
        .strip_prefix(ENDED_MARKER)
        .map_or((false, content), |rest| (true, rest));

    let parsed: PartListXml = quick_xml::de::from_str(body).context(XmlSnafu { payload: body })?;

    let participants = parsed
        .parts
        .into_iter()
        .filter_map(|part| non_empty(part.display_name).or_else(|| non_empty(part.name)))
        .map(|name| normalize_name(&name))
        .collect();

    Ok(CallEvent {
        ended,
        participants,
        body: body.to_owned(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Turns a directory-style "Last, First" name into "First Last".
///
/// Names without a comma are returned unchanged.
///
/// ```
/// use teams2txt::payload::normalize_name;
///
/// assert_eq!(normalize_name("Smith, John"), "John Smith");
/// assert_eq!(normalize_name("John Smith"), "John Smith");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    if !name.contains(',') {
        return name.to_owned();
    }
    name.split(',')
        .map(|part| part.trim_matches(' '))
        .rev()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A call record from a message's `call-log` property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    /// Who placed the call.
    pub originator_participant: CallParty,

    /// Who was called; absent for group calls.
    #[serde(default)]
    pub target_participant: Option<CallParty>,

    /// Ids of everyone in the call.
    #[serde(default)]
    pub participants: Option<Vec<String>>,

    /// End of the call, as exported.
    #[serde(default)]
    pub end_time: Option<String>,
}

/// One side of a [`CallLog`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallParty {
    /// Participant id.
    pub id: String,

    /// Display name, when the log carries one.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Decodes a `call-log` property. It is usually a JSON document inside a
/// string, but an inline object is accepted too.
///
/// # Errors
///
/// Returns an error if the log is malformed or lacks an originator.
pub fn decode_call_log(value: &Value) -> Result<CallLog, PayloadError> {
    decode_embedded(value)
}

/// The parts of a notification (activity feed entry) used for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    /// Id of the user who caused the notification.
    pub sender_id: Option<String>,
    /// Display name of that user.
    pub sender_name: Option<String>,
    /// Preview of the message that triggered the notification.
    pub preview: Option<String>,
    /// Topic of the thread the notification came from.
    pub thread_topic: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityJson {
    #[serde(default)]
    source_user_id: Option<String>,
    #[serde(default)]
    source_user_im_display_name: Option<String>,
    #[serde(default)]
    message_preview: Option<String>,
    #[serde(default)]
    source_thread_topic: Option<String>,
}

/// Decodes a notification from a message's properties.
///
/// The fields live in the nested `activity` object when there is one, and
/// directly in the properties otherwise.
///
/// # Errors
///
/// Returns an error if `activity` is an undecodable JSON string, or if a
/// field has the wrong type.
pub fn decode_notification(properties: &Map<String, Value>) -> Result<Notification, PayloadError> {
    let activity: ActivityJson = match properties.get("activity") {
        Some(activity) => decode_embedded(activity)?,
        None => {
            let value = Value::Object(properties.clone());
            ActivityJson::deserialize(&value).context(JsonSnafu {
                payload: value.to_string(),
            })?
        }
    };

    Ok(Notification {
        sender_id: activity.source_user_id,
        sender_name: activity.source_user_im_display_name,
        preview: activity.message_preview,
        thread_topic: activity.source_thread_topic,
    })
}

/// Decodes `T` from a JSON string holding a document, or from the value itself.
fn decode_embedded<T>(value: &Value) -> Result<T, PayloadError>
where
    T: for<'de> Deserialize<'de>,
{
    match value {
        Value::String(json) => serde_json::from_str(json).context(JsonSnafu { payload: json }),
        other => T::deserialize(other).context(JsonSnafu {
            payload: other.to_string(),
        }),
    }
}
