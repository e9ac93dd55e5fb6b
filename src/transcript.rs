// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Transcript files.
//!
//! A transcript starts with a header and a blank line, followed by one line
//! per rendered message:
//!
//! ```text
//! Id: 19:abc@thread.v2[Chat]
//! Title: Chat
//!
//! Participants:
//! - Alice
//! - Bob
//!
//! 2024-12-05 10:00:00 Text <Bob>   Hello
//! ```

use crate::classifier::ConversationKind;
use crate::renderer::RenderedLine;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use snafu::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Error type for transcript writing failures.
#[derive(Debug, Snafu)]
pub enum WriteError {
    /// A file with the derived name already exists.
    #[snafu(display("refusing to overwrite {}: file already exists", path.display()))]
    Collision {
        /// The existing file.
        path: PathBuf,
    },

    /// The file could not be created.
    #[snafu(display("failed to create {}: {source}", path.display()))]
    Create {
        /// The file that couldn't be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Writing to the file failed.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    Write {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

/// The header block of a transcript.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    /// Conversation id.
    pub id: &'a str,
    /// Conversation kind.
    pub kind: &'a ConversationKind,
    /// Optional title line.
    pub title: Option<&'a str>,
    /// Participant names; the list is omitted when empty.
    pub members: &'a [String],
    /// Conversation metadata to dump after the participants (debug mode).
    pub metadata: Option<&'a Value>,
}

/// Writes a transcript to `out`.
///
/// # Errors
///
/// Returns any I/O error from `out`.
///
/// # Example
///
/// ```
/// use teams2txt::classifier::ConversationKind;
/// use teams2txt::transcript::{Header, write_to};
///
/// let header = Header {
///     id: "19:abc",
///     kind: &ConversationKind::Meeting,
///     title: Some("Standup"),
///     members: &["Alice".to_owned()],
///     metadata: None,
/// };
/// let mut out = Vec::new();
/// write_to(&mut out, &header, &[]).unwrap();
///
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "Id: 19:abc[Meeting]\nTitle: Standup\n\nParticipants:\n- Alice\n\n"
/// );
/// ```
pub fn write_to<W: Write>(
    mut out: W,
    header: &Header<'_>,
    lines: &[RenderedLine],
) -> io::Result<()> {
    writeln!(out, "Id: {}[{}]", header.id, header.kind)?;

    if let Some(title) = header.title {
        writeln!(out, "Title: {title}")?;
    }

    if !header.members.is_empty() {
        writeln!(out, "\nParticipants:")?;
        for name in header.members {
            writeln!(out, "- {name}")?;
        }
    }

    if let Some(metadata) = header.metadata {
        writeln!(out)?;
        let mut ser = serde_json::Serializer::with_formatter(
            &mut out,
            PrettyFormatter::with_indent(b"    "),
        );
        metadata.serialize(&mut ser).map_err(io::Error::from)?;
        writeln!(out)?;
    }

    writeln!(out)?;

    for line in lines {
        writeln!(out, "{line}")?;
    }

    out.flush()
}

/// Creates `dir/file_name` and writes the transcript into it.
///
/// Returns the path of the new file.
///
/// # Errors
///
/// Returns [`WriteError::Collision`] if the file already exists, and an I/O
/// error variant if it can't be created or written.
pub fn write_transcript(
    dir: &Path,
    file_name: &str,
    header: &Header<'_>,
    lines: &[RenderedLine],
) -> Result<PathBuf, WriteError> {
    let path = dir.join(file_name);
    let file = create_new(&path)?;

    write_to(BufWriter::new(file), header, lines).context(WriteSnafu { path: &path })?;

    Ok(path)
}

fn create_new(path: &Path) -> Result<File, WriteError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => CollisionSnafu { path }.fail(),
        Err(e) => Err(e).context(CreateSnafu { path }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(text: &str) -> RenderedLine {
        RenderedLine {
            timestamp: "2024-12-05 10:00:00".into(),
            message_type: "Text".into(),
            sender: Some("<Bob>".into()),
            text: text.into(),
        }
    }

    fn render(header: &Header<'_>, lines: &[RenderedLine]) -> String {
        let mut out = Vec::new();
        write_to(&mut out, header, lines).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_minimal_header_and_lines_in_order() {
        let header = Header {
            id: "48:notifications",
            kind: &ConversationKind::Conversation,
            title: None,
            members: &[],
            metadata: None,
        };
        let output = render(&header, &[line("one"), line("two")]);

        assert_eq!(
            output,
            "Id: 48:notifications[Conversation]\n\n\
             2024-12-05 10:00:00 Text <Bob> one\n\
             2024-12-05 10:00:00 Text <Bob> two\n"
        );
    }

    #[test]
    fn writes_participants() {
        let members = vec!["Alice".to_owned(), "Bob".to_owned()];
        let header = Header {
            id: "19:c",
            kind: &ConversationKind::Chat,
            title: Some("Chat"),
            members: &members,
            metadata: None,
        };
        let output = render(&header, &[]);

        assert_eq!(output, "Id: 19:c[Chat]\nTitle: Chat\n\nParticipants:\n- Alice\n- Bob\n\n");
    }

    #[test]
    fn dumps_metadata_with_four_space_indent() {
        let metadata = json!({"id": "19:c", "type": "Chat"});
        let header = Header {
            id: "19:c",
            kind: &ConversationKind::Chat,
            title: None,
            members: &[],
            metadata: Some(&metadata),
        };
        let output = render(&header, &[line("hi")]);

        assert_eq!(
            output,
            "Id: 19:c[Chat]\n\n{\n    \"id\": \"19:c\",\n    \"type\": \"Chat\"\n}\n\n\
             2024-12-05 10:00:00 Text <Bob> hi\n"
        );
    }

    #[test]
    fn creates_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let header = Header {
            id: "19:c",
            kind: &ConversationKind::Chat,
            title: None,
            members: &[],
            metadata: None,
        };

        let path = write_transcript(dir.path(), "Chat_Bob", &header, &[line("hi")]).unwrap();

        assert_eq!(path, dir.path().join("Chat_Bob"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("Text <Bob> hi\n"));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Chat_Bob"), "keep me").unwrap();
        let header = Header {
            id: "19:c",
            kind: &ConversationKind::Chat,
            title: None,
            members: &[],
            metadata: None,
        };

        let err = write_transcript(dir.path(), "Chat_Bob", &header, &[]).unwrap_err();

        assert!(matches!(err, WriteError::Collision { .. }));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Chat_Bob")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let header = Header {
            id: "19:c",
            kind: &ConversationKind::Chat,
            title: None,
            members: &[],
            metadata: None,
        };

        let err = write_transcript(&dir.path().join("nope"), "Chat_Bob", &header, &[]).unwrap_err();

        assert!(matches!(err, WriteError::Create { .. }));
    }
}
