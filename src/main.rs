// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for teams2txt.
//!
//! This binary provides the `teams2txt` command for converting a Microsoft
//! Teams JSON export into one plain-text transcript per conversation.

use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::PathBuf;
use teams2txt::convert::{self, ConvertOptions};
use teams2txt::parser;
use tracing_subscriber::EnvFilter;

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    input: PathBuf,
    directory: PathBuf,
    name: Option<String>,
    debug: bool,
    dry_run: bool,
    quiet: bool,
    verbose: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("failed to create output directory {}: {source}", path.display()))]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("conversion failed: {source}"))]
    Convert { source: convert::ConvertError },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert Microsoft Teams chat exports to plain-text transcripts

Usage: {name} [OPTIONS] <JSON>

Arguments:
  <JSON>  Teams export file

Options:
  -o, --directory <DIR>  Output directory (default: conversations)
  -n, --name <NAME>      Your display name, left out of chat participants
                         (default: $USER)
      --debug            Include conversation metadata in each transcript
      --dry-run          Show what would be written without writing

Other options:
  -q, --quiet            Only print warnings and errors
  -v, --verbose          Print debug messages
  -h, --help             Print help
  -V, --version          Print version

The log level can also be set with RUST_LOG.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input: Option<PathBuf> = None;
    let mut directory = PathBuf::from("conversations");
    let mut name = None;
    let mut debug = false;
    let mut dry_run = false;
    let mut quiet = false;
    let mut verbose = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("directory") => directory = parser.value()?.parse()?,
            Short('n') | Long("name") => name = Some(parser.value()?.string()?),
            Long("debug") => debug = true,
            Long("dry-run") => dry_run = true,
            Short('q') | Long("quiet") => quiet = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if input.is_none() => input = Some(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input: input.ok_or("missing required argument: <JSON>")?,
        directory,
        name: name.or_else(default_user),
        debug,
        dry_run,
        quiet,
        verbose,
    })
}

/// The login name of the current user.
fn default_user() -> Option<String> {
    ["USER", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .filter(|name| !name.is_empty())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(&cli);

    let json = std::fs::read_to_string(&cli.input).context(ReadFileSnafu { path: &cli.input })?;
    let records = parser::parse_export(&json).context(ParseFileSnafu { path: &cli.input })?;
    tracing::debug!(records = records.len(), "parsed {}", cli.input.display());

    if !cli.dry_run {
        std::fs::create_dir_all(&cli.directory).context(CreateOutputDirSnafu {
            path: &cli.directory,
        })?;
    }

    let opts = ConvertOptions {
        output_dir: cli.directory,
        local_user: cli.name,
        debug: cli.debug,
        dry_run: cli.dry_run,
    };
    let summary = convert::convert(records, &opts).context(ConvertSnafu)?;

    if !cli.quiet {
        let verb = if opts.dry_run { "Would write" } else { "Written" };
        eprintln!("{verb} {summary}");
    }
    Ok(())
}
