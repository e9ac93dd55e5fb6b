// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert Microsoft Teams chat exports to plain-text transcripts.
//!
//! This crate reads the JSON export of a Teams client's local storage and
//! writes one transcript file per conversation: chats, meetings, team spaces,
//! channel topics, the call log and the activity feed.
//!
//! # Overview
//!
//! An export is a flat array of store records. This crate:
//!
//! 1. Parses the records into typed Rust representations
//! 2. Learns participant names from conversation metadata
//! 3. Groups messages by conversation, keeping export order
//! 4. Classifies each conversation and derives its title and file name
//! 5. Renders every message as a single transcript line
//! 6. Writes the transcripts, never overwriting an existing file
//!
//! # Example
//!
//! ```no_run
//! use teams2txt::{convert, parser};
//!
//! let json = std::fs::read_to_string("teams.json").unwrap();
//! let records = parser::parse_export(&json).unwrap();
//!
//! let opts = convert::ConvertOptions {
//!     local_user: Some("Alice".into()),
//!     ..Default::default()
//! };
//! std::fs::create_dir_all(&opts.output_dir).unwrap();
//!
//! let summary = convert::convert(records, &opts).unwrap();
//! println!("Written {summary}");
//! ```
//!
//! # Modules
//!
//! - [`parser`]: JSON parsing and type definitions for export records
//! - [`entities`]: participant id to display name lookup
//! - [`grouping`]: messages and metadata per conversation
//! - [`classifier`]: conversation kinds, titles and file names
//! - [`payload`]: decoders for XML and JSON embedded in messages
//! - [`renderer`]: per-message rendering and the handler registry
//! - [`transcript`]: transcript file layout and writing
//! - [`convert`]: the end-to-end pipeline

#![deny(missing_docs)]

pub mod classifier;
pub mod convert;
pub mod entities;
pub mod grouping;
mod html;
pub mod parser;
pub mod payload;
pub mod renderer;
pub mod transcript;
