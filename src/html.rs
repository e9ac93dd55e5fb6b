// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Flattening of rich-text HTML messages into Markdown-flavoured text.
//!
//! `<b>`/`<strong>` become `**bold**`, `<i>`/`<em>` become `_em_`, links stay
//! inline as `[text](url)` and images are replaced by their alt text.

use html2text::render::text_renderer::{TaggedLine, TextDecorator};

/// Wrap width handed to the converter; wide enough to never wrap.
const UNWRAPPED_WIDTH: usize = 10_000;

/// Converts an HTML fragment to text.
pub fn to_text(html: &str) -> Result<String, html2text::Error> {
    html2text::config::with_decorator(InlineDecorator::default())
        .string_from_read(bold_as_strong(html).as_bytes(), UNWRAPPED_WIDTH)
}

/// Renames `<b>` tags to `<strong>`, the only bold element the converter knows.
fn bold_as_strong(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tag = &rest[pos + 1..];
        let (slash, name) = tag.strip_prefix('/').map_or(("", tag), |name| ("/", name));

        let is_bold = name.starts_with(['b', 'B'])
            && name[1..].starts_with(|c: char| c == '>' || c == '/' || c.is_ascii_whitespace());
        if is_bold {
            out.push('<');
            out.push_str(slash);
            out.push_str("strong");
            rest = &name[1..];
        } else {
            out.push('<');
            rest = tag;
        }
    }
    out.push_str(rest);
    out
}

/// Plain-text decorator keeping link targets inline and images as alt text.
#[derive(Debug, Clone, Default)]
struct InlineDecorator {
    links: Vec<String>,
}

impl TextDecorator for InlineDecorator {
    type Annotation = ();

    fn decorate_link_start(&mut self, url: &str) -> (String, Self::Annotation) {
        self.links.push(url.to_owned());
        ("[".to_owned(), ())
    }

    fn decorate_link_end(&mut self) -> String {
        self.links
            .pop()
            .map_or_else(|| "]".to_owned(), |url| format!("]({url})"))
    }

    fn decorate_em_start(&self) -> (String, Self::Annotation) {
        ("_".to_owned(), ())
    }

    fn decorate_em_end(&self) -> String {
        "_".to_owned()
    }

    fn decorate_strong_start(&self) -> (String, Self::Annotation) {
        ("**".to_owned(), ())
    }

    fn decorate_strong_end(&self) -> String {
        "**".to_owned()
    }

    fn decorate_strikeout_start(&self) -> (String, Self::Annotation) {
        ("~~".to_owned(), ())
    }

    fn decorate_strikeout_end(&self) -> String {
        "~~".to_owned()
    }

    fn decorate_code_start(&self) -> (String, Self::Annotation) {
        ("`".to_owned(), ())
    }

    fn decorate_code_end(&self) -> String {
        "`".to_owned()
    }

    fn decorate_preformat_first(&self) -> Self::Annotation {}

    fn decorate_preformat_cont(&self) -> Self::Annotation {}

    fn decorate_image(&mut self, _src: &str, title: &str) -> (String, Self::Annotation) {
        (title.to_owned(), ())
    }

    fn header_prefix(&self, level: usize) -> String {
        "#".repeat(level) + " "
    }

    fn quote_prefix(&self) -> String {
        "> ".to_owned()
    }

    fn unordered_item_prefix(&self) -> String {
        "* ".to_owned()
    }

    fn ordered_item_prefix(&self, i: i64) -> String {
        format!("{i}. ")
    }

    fn make_subblock_decorator(&self) -> Self {
        Self::default()
    }

    fn finalise(&mut self, _links: Vec<String>) -> Vec<TaggedLine<Self::Annotation>> {
        Vec::new()
    }
}
