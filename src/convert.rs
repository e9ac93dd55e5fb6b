// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! The conversion pipeline: records in, one transcript per conversation out.
//!
//! The whole export is indexed before anything is written:
//!
//! 1. [`EntityIndex::build`] learns participant names
//! 2. [`grouping::group`] collects messages and metadata per conversation
//! 3. for every conversation, [`classifier::classify`] derives kind, title,
//!    members and file name, the [`Registry`] renders each message, and
//!    [`transcript::write_transcript`] writes the file
//!
//! Unknown conversation types and messages without conversation metadata are
//! reported as [`Diagnostic`]s; everything else that goes wrong aborts the run.

use crate::classifier::{self, ConversationKind};
use crate::entities::EntityIndex;
use crate::grouping::{self, ConversationGroup};
use crate::parser::Record;
use crate::renderer::{Registry, RenderContext, RenderError, RenderedLine};
use crate::transcript::{self, Header, WriteError};
use snafu::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Error type for a failed conversion. Files written before the failure are kept.
#[derive(Debug, Snafu)]
pub enum ConvertError {
    /// A message could not be rendered.
    #[snafu(display("failed to render conversation {conversation_id}: {source}"))]
    Render {
        /// The conversation being rendered.
        conversation_id: String,
        /// The rendering error.
        source: RenderError,
    },

    /// A transcript could not be written.
    #[snafu(display("failed to write conversation {conversation_id}: {source}"))]
    Write {
        /// The conversation being written.
        conversation_id: String,
        /// The writing error.
        source: WriteError,
    },
}

/// Settings for a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Directory receiving the transcripts. Must exist unless `dry_run` is set.
    pub output_dir: PathBuf,
    /// Display name of the local user, left out of chat member lists and file names.
    pub local_user: Option<String>,
    /// Include the conversation metadata in every transcript.
    pub debug: bool,
    /// Render everything but write nothing.
    pub dry_run: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("conversations"),
            local_user: None,
            debug: false,
            dry_run: false,
        }
    }
}

/// A non-fatal problem found during conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Conversation metadata carries a type tag this crate doesn't know.
    UnknownType {
        /// The conversation id.
        conversation_id: String,
        /// The unknown type tag.
        kind: String,
    },
    /// Messages refer to a conversation without metadata.
    OrphanMessages {
        /// The conversation id.
        conversation_id: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType {
                conversation_id,
                kind,
            } => write!(f, "Unknown conversation type {kind} ({conversation_id})"),
            Self::OrphanMessages { conversation_id } => {
                write!(f, "Unknown conversation {conversation_id}")
            }
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Conversations per type name, in order of first appearance.
    pub counts: Vec<(String, usize)>,
    /// Advisory problems, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
    /// Files written, or that would have been written in a dry run.
    pub files: Vec<PathBuf>,
}

impl Summary {
    fn count(&mut self, kind: &ConversationKind) {
        if let Some((_, n)) = self.counts.iter_mut().find(|(name, _)| name == kind.name()) {
            *n += 1;
        } else {
            self.counts.push((kind.name().to_owned(), 1));
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

/// Formats the per-type counts, e.g. `3 Chats, 1 Meeting`.
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, n)) in self.counts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let plural = if *n > 1 { "s" } else { "" };
            write!(f, "{n} {name}{plural}")?;
        }
        Ok(())
    }
}

/// Converts parsed records with the default [`Registry`].
///
/// # Errors
///
/// See [`convert_with`].
pub fn convert(records: Vec<Record>, options: &ConvertOptions) -> Result<Summary, ConvertError> {
    convert_with(records, options, &Registry::default())
}

/// Converts parsed records, rendering messages with `registry`.
///
/// # Errors
///
/// Returns an error if a message can't be rendered, a file name is derived
/// twice or already exists, or a transcript can't be written.
pub fn convert_with(
    records: Vec<Record>,
    options: &ConvertOptions,
    registry: &Registry,
) -> Result<Summary, ConvertError> {
    let index = EntityIndex::build(&records);
    debug!(names = index.len(), "indexed participants");

    let groups = grouping::group(records);
    debug!(conversations = groups.len(), "grouped messages");

    let mut summary = Summary::default();
    let mut planned = HashSet::new();

    for group in groups.iter() {
        if group.metadata.is_none() {
            summary.report(Diagnostic::OrphanMessages {
                conversation_id: group.id.to_owned(),
            });
        }

        let class = classifier::classify(group.metadata, &index, options.local_user.as_deref());
        if let ConversationKind::Other(tag) = &class.kind {
            summary.report(Diagnostic::UnknownType {
                conversation_id: group.id.to_owned(),
                kind: tag.clone(),
            });
        }
        summary.count(&class.kind);

        let file_name = class.file_name(group.id);
        let lines = render_group(&group, &class.kind, class.sender_width(), &index, registry)?;

        let header = Header {
            id: group.id,
            kind: &class.kind,
            title: class.title.as_deref(),
            members: &class.members,
            metadata: group
                .metadata
                .filter(|_| options.debug)
                .map(|conv| &conv.raw),
        };

        let path = if options.dry_run {
            let path = options.output_dir.join(&file_name);
            if !planned.insert(file_name) || path.exists() {
                return Err(WriteError::Collision { path }).context(WriteSnafu {
                    conversation_id: group.id,
                });
            }
            info!("Would write {} ({} lines)", path.display(), lines.len());
            path
        } else {
            let path = transcript::write_transcript(&options.output_dir, &file_name, &header, &lines)
                .context(WriteSnafu {
                    conversation_id: group.id,
                })?;
            info!("Wrote {} ({} lines)", path.display(), lines.len());
            path
        };
        summary.files.push(path);
    }

    Ok(summary)
}

fn render_group(
    group: &ConversationGroup<'_>,
    kind: &ConversationKind,
    sender_width: usize,
    index: &EntityIndex,
    registry: &Registry,
) -> Result<Vec<RenderedLine>, ConvertError> {
    let ctx = RenderContext {
        index,
        kind,
        sender_width,
    };

    let mut lines = Vec::with_capacity(group.messages.len());
    for message in group.messages {
        if let Some(line) = registry.render(message, &ctx).context(RenderSnafu {
            conversation_id: group.id,
        })? {
            lines.push(line);
        }
    }
    Ok(lines)
}
