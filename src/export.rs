// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! The export run: fetch, merge, render, write.

use crate::config::ExportOptions;
use crate::discussion::Discussion;
use crate::index;
use crate::merge;
use crate::renderer;
use crate::sink::{self, Artifact, Sink, WriteError};
use crate::source::{self, PagedSource, SourceError};
use snafu::prelude::*;
use std::sync::Arc;
use tracing::{info, instrument};

/// Path of the generated index table.
pub const README_PATH: &str = "README.md";

/// Path of the generated table of contents.
pub const SUMMARY_PATH: &str = "SUMMARY.md";

/// Error type for a failed export run.
#[derive(Debug, Snafu)]
pub enum ExportError {
    /// Discussions could not be fetched.
    #[snafu(display("failed to fetch discussions: {source}"))]
    Fetch {
        /// The underlying source error.
        source: SourceError,
    },

    /// A snapshot could not be serialized.
    #[snafu(display("failed to serialize discussion {identity}: {source}"))]
    Snapshot {
        /// Identity of the discussion.
        identity: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A rendered file could not be written.
    #[snafu(display("failed to write output: {source}"))]
    Write {
        /// The underlying write error.
        source: WriteError,
    },
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Nodes received from the source.
    pub fetched: usize,
    /// Discussions left after deduplication.
    pub exported: usize,
    /// Files written, including README and SUMMARY.
    pub files_written: usize,
}

/// Runs one export from `source` into `sink`.
///
/// # Errors
///
/// Returns the first fetch, render, or write failure. Files written before
/// the failure are left in place.
#[instrument(skip_all, fields(repository = %opts.repository))]
pub async fn export<P, S>(
    source: &mut P,
    sink: &Arc<S>,
    opts: &ExportOptions,
) -> Result<ExportSummary, ExportError>
where
    P: PagedSource,
    S: Sink,
{
    info!("fetching discussions");
    let fetched = source::fetch_all(source, opts.page_size)
        .await
        .context(FetchSnafu)?;
    let fetched_count = fetched.len();

    let mut discussions = merge::deduplicate(fetched);
    merge::sort_discussions(&mut discussions, &opts.category_order);
    info!(
        fetched = fetched_count,
        kept = discussions.len(),
        "merged discussions"
    );

    let artifacts = render_all(&discussions, opts)?;
    let files_written = sink::write_all(sink, artifacts, opts.concurrency)
        .await
        .context(WriteSnafu)?;

    info!(total = discussions.len(), "done");
    Ok(ExportSummary {
        fetched: fetched_count,
        exported: discussions.len(),
        files_written,
    })
}

/// Renders every output file for an ordered discussion list.
///
/// Each discussion yields its snapshot and document, followed by README and
/// SUMMARY for the whole list.
///
/// # Errors
///
/// Returns an error if a snapshot cannot be serialized.
pub fn render_all(
    discussions: &[Discussion],
    opts: &ExportOptions,
) -> Result<Vec<Artifact>, ExportError> {
    let render = &opts.render;
    let mut artifacts = Vec::with_capacity(discussions.len() * 2 + 2);

    for discussion in discussions {
        let snapshot = renderer::render_snapshot(discussion).context(SnapshotSnafu {
            identity: discussion.identity.to_string(),
        })?;
        artifacts.push(Artifact::new(renderer::snapshot_path(discussion), snapshot));
        artifacts.push(Artifact::new(
            renderer::document_path(discussion, render),
            renderer::render_document(discussion, render),
        ));
    }

    let index = index::build_index(discussions, &opts.repository, render);
    artifacts.push(Artifact::new(
        README_PATH,
        index::render_readme(&index, &opts.readme_intro, &opts.readme_footer),
    ));
    artifacts.push(Artifact::new(SUMMARY_PATH, index::render_summary(&index)));

    Ok(artifacts)
}
