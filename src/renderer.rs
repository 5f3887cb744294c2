// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Per-discussion output: JSON snapshot, Markdown document, and their paths.
//!
//! # Output Format
//!
//! Each discussion produces two files:
//! - `discussions/<number>_<id>.json`, the node pretty-printed as received
//! - `markdowns/<year>/<month>/<number>_<id>.md`, a Markdown document
//!
//! The document starts with a `---` delimited header:
//!
//! ```text
//! ---
//! author: octocat
//! category: 📣 Announcements
//! labels: rust, notes
//! discussion: https://github.com/octo/blog/discussions/12
//! updatedAt: "2024-03-02T19:30:00+08:00"
//! ---
//!
//! # Release notes
//!
//! Body text
//! ```
//!
//! Missing header values render as the quoted placeholder `"-"`.
//!
//! Year and month come from `createdAt` shifted into a fixed offset
//! (UTC+8 unless configured otherwise), so a discussion opened late on
//! New Year's Eve UTC lands in January.

use crate::discussion::Discussion;
use chrono::{DateTime, Datelike, FixedOffset};
use std::fmt::{self, Write};

/// Title used when a discussion has none.
pub const DEFAULT_TITLE: &str = "Unknown title";

/// Body used when a discussion's body is empty after trimming.
pub const DEFAULT_BODY: &str = "No content";

/// Header value used for missing fields.
pub const PLACEHOLDER: &str = "\"-\"";

/// Directory that holds the JSON snapshots.
pub const SNAPSHOT_DIR: &str = "discussions";

/// Directory that holds the Markdown documents.
pub const DOCUMENT_DIR: &str = "markdowns";

/// Configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Offset used for document paths and displayed timestamps.
    pub utc_offset: FixedOffset,
}

/// A year/month bucket derived from a discussion's creation time.
///
/// Displays as `<year>/<month>` with a 1-based, unpadded month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    /// Calendar year.
    pub year: i32,
    /// Month, 1 through 12.
    pub month: u32,
}

impl MonthKey {
    /// Returns the bucket `discussion` was created in.
    #[must_use]
    pub fn of(discussion: &Discussion, opts: &RenderOptions) -> Self {
        let created = discussion.created_at.with_timezone(&opts.utc_offset);
        Self {
            year: created.year(),
            month: created.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.month)
    }
}

/// Returns the snapshot path, relative to the output root.
#[must_use]
pub fn snapshot_path(discussion: &Discussion) -> String {
    format!("{SNAPSHOT_DIR}/{}.json", discussion.identity)
}

/// Returns the document path relative to the `markdowns/` root.
///
/// README and SUMMARY link to documents with this path.
#[must_use]
pub fn index_link(discussion: &Discussion, opts: &RenderOptions) -> String {
    format!("{}/{}.md", MonthKey::of(discussion, opts), discussion.identity)
}

/// Returns the document path, relative to the output root.
#[must_use]
pub fn document_path(discussion: &Discussion, opts: &RenderOptions) -> String {
    format!("{DOCUMENT_DIR}/{}", index_link(discussion, opts))
}

/// Formats a timestamp in the configured offset, e.g. `2024-03-02T19:30:00+08:00`.
#[must_use]
pub fn format_timestamp(at: &DateTime<FixedOffset>, opts: &RenderOptions) -> String {
    at.with_timezone(&opts.utc_offset)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Returns the title, or [`DEFAULT_TITLE`] when it is empty.
#[must_use]
pub fn display_title(discussion: &Discussion) -> &str {
    if discussion.title.is_empty() {
        DEFAULT_TITLE
    } else {
        &discussion.title
    }
}

/// Serializes the discussion node as received, with 2-space indentation.
///
/// # Errors
///
/// Returns an error only if the node cannot be serialized, which does not
/// happen for values produced by `serde_json` itself.
pub fn render_snapshot(discussion: &Discussion) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&discussion.raw)
}

/// Renders a discussion as a Markdown document with a metadata header.
#[must_use]
pub fn render_document(discussion: &Discussion, opts: &RenderOptions) -> String {
    let category = discussion
        .category
        .as_ref()
        .map(crate::discussion::Category::display_name)
        .unwrap_or_default();
    let labels = discussion.labels.join(", ");
    let updated_at = format!("\"{}\"", format_timestamp(&discussion.updated_at, opts));

    let header = [
        ("author", discussion.author.as_deref().unwrap_or_default()),
        ("category", category.as_str()),
        ("labels", labels.as_str()),
        ("discussion", discussion.url.as_str()),
        ("updatedAt", updated_at.as_str()),
    ];

    let mut out = String::from("---\n");
    for (key, value) in header {
        writeln!(out, "{key}: {}", field_or_placeholder(value)).unwrap();
    }
    out.push_str("---\n\n");

    writeln!(out, "# {}\n", display_title(discussion)).unwrap();

    let body = discussion.body.trim();
    if body.is_empty() {
        out.push_str(DEFAULT_BODY);
    } else {
        out.push_str(body);
    }
    out.push('\n');

    out
}

/// Returns `value`, or [`PLACEHOLDER`] when it is empty.
fn field_or_placeholder(value: &str) -> &str {
    if value.is_empty() { PLACEHOLDER } else { value }
}
