// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Paged sources of discussion nodes.
//!
//! A [`PagedSource`] hands out discussions one page at a time, driven by an
//! opaque cursor. Two sources exist:
//!
//! - [`GithubSource`] queries the GitHub GraphQL API.
//! - [`SnapshotSource`] replays a directory of previously exported snapshots.
//!
//! [`fetch_all`] walks a source until it reports the last page.

use crate::config::RepoSlug;
use crate::discussion::{DecodeError, Discussion};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use snafu::{OptionExt, ensure, prelude::*};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// Public GitHub GraphQL endpoint.
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// User-Agent sent with API requests; GitHub rejects requests without one.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DISCUSSIONS_QUERY: &str = r"
query get_discussions($owner: String!, $repo: String!, $after: String, $limit: Int = 10) {
  repository(owner: $owner, name: $repo) {
    discussions(first: $limit, after: $after) {
      pageInfo {
        endCursor
        startCursor
        hasNextPage
      }
      nodes {
        id
        labels(first: 10) {
          nodes {
            id
            name
            resourcePath
            url
          }
        }
        category {
          id
          name
          emoji
          emojiHTML
          slug
        }
        number
        title
        body
        author {
          login
        }
        authorAssociation
        createdAt
        updatedAt
        repository {
          id
          url
          resourcePath
        }
        url
        resourcePath
      }
    }
  }
}";

/// Error type for failures while reading pages.
#[derive(Debug, Snafu)]
pub enum SourceError {
    /// The HTTP client could not be built.
    #[snafu(display("failed to build HTTP client: {source}"))]
    Client {
        /// The underlying reqwest error.
        source: reqwest::Error,
    },

    /// The request did not complete or its body was not JSON.
    #[snafu(display("request to {endpoint} failed: {source}"))]
    Request {
        /// The GraphQL endpoint.
        endpoint: String,
        /// The underlying reqwest error.
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[snafu(display("{endpoint} returned {status}: {body}"))]
    Status {
        /// The GraphQL endpoint.
        endpoint: String,
        /// The HTTP status.
        status: StatusCode,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The API answered with GraphQL errors.
    #[snafu(display("GraphQL query failed: {messages}"))]
    GraphQl {
        /// Error messages joined with `; `.
        messages: String,
    },

    /// The repository does not exist or the token cannot see it.
    #[snafu(display("repository {repository} not found or not accessible"))]
    RepositoryNotFound {
        /// The repository that was queried.
        repository: String,
    },

    /// More pages were announced without a cursor to reach them.
    #[snafu(display("page reports more results but carries no cursor"))]
    MissingCursor,

    /// A cursor handed back to a source was not one it produced.
    #[snafu(display("invalid cursor {cursor:?}"))]
    InvalidCursor {
        /// The rejected cursor.
        cursor: String,
    },

    /// A snapshot file could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadSnapshot {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A snapshot file is not JSON.
    #[snafu(display("failed to parse {}: {source}", path.display()))]
    SnapshotJson {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A snapshot directory could not be listed.
    #[snafu(display("failed to scan {}: {source}", path.display()))]
    ScanSnapshots {
        /// The snapshot directory.
        path: PathBuf,
        /// The underlying walk error.
        source: walkdir::Error,
    },

    /// A node on a page could not be decoded.
    #[snafu(display("malformed discussion in {origin}: {source}"))]
    Decode {
        /// Where the node came from (page number or file path).
        origin: String,
        /// The decoding error.
        source: DecodeError,
    },
}

/// One page of raw discussion nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Discussion nodes as received.
    pub items: Vec<Value>,
    /// Cursor for the following page.
    pub next_cursor: Option<String>,
    /// Whether another page follows.
    pub has_more: bool,
}

/// A source of discussion nodes read one page at a time.
pub trait PagedSource {
    /// Fetches the page after `cursor`, or the first page when `cursor` is `None`.
    fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> impl Future<Output = Result<Page, SourceError>> + Send;
}

/// Reads every page of `source` and decodes the nodes.
///
/// Pages are requested one after another, each with the cursor returned by
/// the previous page.
///
/// # Errors
///
/// Returns the first fetch or decode failure; nothing is retried.
#[instrument(skip_all, fields(page_size = page_size))]
pub async fn fetch_all<S: PagedSource>(
    source: &mut S,
    page_size: u32,
) -> Result<Vec<Discussion>, SourceError> {
    let mut discussions = Vec::new();
    let mut cursor: Option<String> = None;

    for page_number in 1_u32.. {
        let page = source.fetch_page(cursor.as_deref(), page_size).await?;
        info!(page = page_number, count = page.items.len(), "fetched discussions");

        for item in page.items {
            let discussion = Discussion::from_value(item).context(DecodeSnafu {
                origin: format!("page {page_number}"),
            })?;
            discussions.push(discussion);
        }

        if !page.has_more {
            break;
        }
        cursor = Some(page.next_cursor.context(MissingCursorSnafu)?);
    }

    Ok(discussions)
}

// ---------------------------------------------------------------------------
// GitHub GraphQL
// ---------------------------------------------------------------------------

/// Reads discussions from the GitHub GraphQL API.
#[derive(Debug, Clone)]
pub struct GithubSource {
    client: Client,
    endpoint: String,
    token: String,
    repository: RepoSlug,
}

impl GithubSource {
    /// Creates a source for `repository` authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        repository: RepoSlug,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context(ClientSnafu)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
            repository,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    repository: Option<RepositoryData>,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    discussions: DiscussionConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

impl PagedSource for GithubSource {
    async fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<Page, SourceError> {
        let endpoint = self.endpoint.as_str();
        let payload = json!({
            "query": DISCUSSIONS_QUERY,
            "variables": {
                "owner": self.repository.owner,
                "repo": self.repository.name,
                "after": cursor,
                "limit": page_size,
            },
        });

        debug!(%endpoint, ?cursor, "requesting page");
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .context(RequestSnafu { endpoint })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return StatusSnafu {
                endpoint,
                status,
                body,
            }
            .fail();
        }

        let parsed: GraphQlResponse = response.json().await.context(RequestSnafu { endpoint })?;

        ensure!(
            parsed.errors.is_empty(),
            GraphQlSnafu {
                messages: parsed
                    .errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            }
        );

        let connection = parsed
            .data
            .and_then(|d| d.repository)
            .context(RepositoryNotFoundSnafu {
                repository: self.repository.to_string(),
            })?
            .discussions;

        Ok(Page {
            items: connection.nodes,
            next_cursor: connection.page_info.end_cursor,
            has_more: connection.page_info.has_next_page,
        })
    }
}

// ---------------------------------------------------------------------------
// Snapshot directory
// ---------------------------------------------------------------------------

/// Replays exported `*.json` snapshots as if they came from the API.
///
/// Files are found recursively and served in path order; the cursor is the
/// index of the next file.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    files: Vec<PathBuf>,
}

impl SnapshotSource {
    /// Lists the snapshot files under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be walked.
    pub fn open(dir: &Path) -> Result<Self, SourceError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.context(ScanSnapshotsSnafu { path: dir })?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(Self { files })
    }

    /// Number of snapshot files found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no snapshot files were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl PagedSource for SnapshotSource {
    async fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<Page, SourceError> {
        let start = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .ok()
                .filter(|&i| i <= self.files.len())
                .context(InvalidCursorSnafu { cursor: c })?,
        };
        let page_size = usize::try_from(page_size.max(1)).unwrap_or(usize::MAX);
        let end = start.saturating_add(page_size).min(self.files.len());

        let mut items = Vec::with_capacity(end - start);
        for path in &self.files[start..end] {
            let text = tokio::fs::read_to_string(path)
                .await
                .context(ReadSnapshotSnafu { path })?;
            let value: Value =
                serde_json::from_str(&text).context(SnapshotJsonSnafu { path })?;
            items.push(value);
        }

        let has_more = end < self.files.len();
        Ok(Page {
            items,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }
}
