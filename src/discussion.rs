// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Typed view of a GitHub Discussions GraphQL node.
//!
//! The GraphQL API returns each discussion as a JSON object. This module
//! decodes the fields the exporter needs into a [`Discussion`] while keeping
//! the raw object around, so the JSON snapshot can be written back
//! exactly as it was received.
//!
//! # Format Overview
//!
//! A discussion node contains:
//! - Identity: the repository-scoped `number` and the global node `id`
//! - Authorship: `author.login` and `authorAssociation`
//! - Timestamps: `createdAt` and `updatedAt` in RFC 3339
//! - Presentation: `title`, `body`, `url`, `category`, `labels`
//!
//! # Example
//!
//! ```
//! use discussions2md::discussion::{AuthorAssociation, Discussion};
//!
//! let node = serde_json::json!({
//!     "id": "D_kwDOAbc",
//!     "number": 7,
//!     "title": "Hello",
//!     "body": "First post",
//!     "url": "https://github.com/octo/blog/discussions/7",
//!     "authorAssociation": "OWNER",
//!     "createdAt": "2024-01-02T03:04:05Z",
//!     "updatedAt": "2024-01-03T03:04:05Z"
//! });
//!
//! let discussion = Discussion::from_value(node).unwrap();
//! assert_eq!(discussion.identity.to_string(), "7_D_kwDOAbc");
//! assert_eq!(discussion.author_association, AuthorAssociation::Owner);
//! ```

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use snafu::prelude::*;
use std::fmt;

/// Error type for discussion nodes that cannot be decoded.
#[derive(Debug, Snafu)]
pub enum DecodeError {
    /// A field the exporter cannot do without is absent or has the wrong type.
    #[snafu(display("discussion node is missing required field `{field}`"))]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },

    /// A timestamp field is not valid RFC 3339.
    #[snafu(display("discussion {identity}: invalid `{field}` timestamp {value:?}: {source}"))]
    Timestamp {
        /// Identity of the offending discussion.
        identity: Identity,
        /// Name of the timestamp field.
        field: &'static str,
        /// The raw value that failed to parse.
        value: String,
        /// The underlying chrono error.
        source: chrono::ParseError,
    },

    /// The node id cannot be used as a file name component.
    #[snafu(display("discussion {number}: node id {id:?} is not a plain file name"))]
    UnsafeId {
        /// Discussion number.
        number: u64,
        /// The rejected node id.
        id: String,
    },
}

/// The logical identity of a discussion.
///
/// GitHub keeps both parts stable across edits, so two nodes with the same
/// identity describe the same discussion even if their content differs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    /// Repository-scoped discussion number.
    pub number: u64,
    /// Global GraphQL node id.
    pub id: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.number, self.id)
    }
}

/// How the author relates to the repository.
///
/// Only [`AuthorAssociation::Owner`] matters to the exporter; every other
/// association is kept verbatim for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorAssociation {
    /// The repository owner.
    Owner,
    /// Any other association (`MEMBER`, `CONTRIBUTOR`, `NONE`, ...).
    Other(String),
}

impl AuthorAssociation {
    fn parse(value: &str) -> Self {
        if value == "OWNER" {
            Self::Owner
        } else {
            Self::Other(value.to_owned())
        }
    }
}

/// A discussion category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Category {
    /// Display name (e.g., "Announcements").
    pub name: String,
    /// URL slug (e.g., "announcements").
    pub slug: String,
    /// Emoji wrapped in HTML (e.g., `<div>📣</div>`).
    pub emoji_html: Option<String>,
}

impl Category {
    /// Returns the emoji rendered inside [`Category::emoji_html`], if any.
    #[must_use]
    pub fn emoji(&self) -> Option<&str> {
        let html = self.emoji_html.as_deref()?;
        let (_, rest) = html.split_once('>')?;
        let (emoji, _) = rest.split_once('<')?;
        Some(emoji).filter(|e| !e.is_empty())
    }

    /// Returns the category name prefixed with its emoji, e.g. `📣 Announcements`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.emoji() {
            Some(emoji) => format!("{emoji} {}", self.name),
            None => self.name.clone(),
        }
    }
}

/// One discussion as returned by a page of the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Discussion {
    /// Number and node id.
    pub identity: Identity,
    /// How the author relates to the repository.
    pub author_association: AuthorAssociation,
    /// Author login; `None` for deleted accounts.
    pub author: Option<String>,
    /// When the discussion was opened.
    pub created_at: DateTime<FixedOffset>,
    /// When the discussion was last edited.
    pub updated_at: DateTime<FixedOffset>,
    /// The category, if the node carries one.
    pub category: Option<Category>,
    /// Label names in the order GitHub returned them.
    pub labels: Vec<String>,
    /// Discussion title; may be empty.
    pub title: String,
    /// Markdown body; may be empty.
    pub body: String,
    /// Link to the discussion on GitHub.
    pub url: String,
    /// The node exactly as received.
    pub raw: Value,
}

impl Discussion {
    /// Decodes a GraphQL discussion node.
    ///
    /// # Errors
    ///
    /// Returns an error if `id`, `number`, `authorAssociation`, `createdAt` or
    /// `updatedAt` is missing, if a timestamp is not RFC 3339, or if the id
    /// could not be used safely in an output path.
    pub fn from_value(raw: Value) -> Result<Self, DecodeError> {
        let number = raw
            .get("number")
            .and_then(Value::as_u64)
            .context(MissingFieldSnafu { field: "number" })?;
        let id = get_string(&raw, &["id"]).context(MissingFieldSnafu { field: "id" })?;
        ensure!(is_plain_id(&id), UnsafeIdSnafu { number, id });
        let identity = Identity { number, id };

        let author_association = get_str(&raw, &["authorAssociation"])
            .map(AuthorAssociation::parse)
            .context(MissingFieldSnafu {
                field: "authorAssociation",
            })?;

        let created_at = timestamp(&raw, &identity, "createdAt")?;
        let updated_at = timestamp(&raw, &identity, "updatedAt")?;

        let category = raw
            .get("category")
            .filter(|c| c.is_object())
            .map(|c| Category {
                name: get_string(c, &["name"]).unwrap_or_default(),
                slug: get_string(c, &["slug"]).unwrap_or_default(),
                emoji_html: get_string(c, &["emojiHTML"]),
            });

        Ok(Self {
            author: get_string(&raw, &["author", "login"]),
            labels: extract_labels(&raw),
            title: get_string(&raw, &["title"]).unwrap_or_default(),
            body: get_string(&raw, &["body"]).unwrap_or_default(),
            url: get_string(&raw, &["url"]).unwrap_or_default(),
            identity,
            author_association,
            created_at,
            updated_at,
            category,
            raw,
        })
    }

    /// Returns `true` if the repository owner wrote this discussion.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.author_association == AuthorAssociation::Owner
    }

    /// Returns the category slug, if the discussion has a category.
    #[must_use]
    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.slug.as_str())
    }
}

/// Node ids end up in file names, so they must not be empty or contain
/// path separators or `..`.
fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && !id.contains("..")
}

fn timestamp(
    value: &Value,
    identity: &Identity,
    field: &'static str,
) -> Result<DateTime<FixedOffset>, DecodeError> {
    let text = get_str(value, &[field]).context(MissingFieldSnafu { field })?;
    DateTime::parse_from_rfc3339(text).context(TimestampSnafu {
        identity: identity.clone(),
        field,
        value: text,
    })
}

/// Extracts label names from the `labels.nodes` connection.
fn extract_labels(value: &Value) -> Vec<String> {
    value
        .get("labels")
        .and_then(|l| l.get("nodes"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|label| label.get("name")?.as_str())
        .map(str::to_owned)
        .collect()
}

/// Navigates a JSON path and returns the string value at the end.
fn get_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str()
}

/// Like [`get_str`] but returns an owned `String`.
fn get_string(value: &Value, path: &[&str]) -> Option<String> {
    get_str(value, path).map(str::to_owned)
}
