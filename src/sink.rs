// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Destinations for rendered files.
//!
//! A [`Sink`] stores a payload under a relative path, creating parent
//! directories as needed. [`write_all`] pushes a batch of [`Artifact`]s
//! through a sink with a bounded number of writes in flight.

use snafu::prelude::*;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Error type for failed writes.
#[derive(Debug, Snafu)]
pub enum WriteError {
    /// A parent directory could not be created.
    #[snafu(display("failed to create directory {}: {source}", path.display()))]
    CreateDir {
        /// The directory.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        /// The file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A write task panicked.
    #[snafu(display("write task failed: {source}"))]
    Join {
        /// The underlying join error.
        source: tokio::task::JoinError,
    },
}

/// A rendered file waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the sink's root, `/`-separated.
    pub path: String,
    /// File contents.
    pub contents: String,
}

impl Artifact {
    /// Creates an artifact.
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Somewhere rendered files can be stored.
///
/// Writes to distinct paths must be safe to run concurrently.
pub trait Sink: Send + Sync + 'static {
    /// Stores `contents` at `path`, creating parent directories as needed.
    fn write(
        &self,
        path: &str,
        contents: &[u8],
    ) -> impl Future<Output = Result<(), WriteError>> + Send;
}

/// Writes files below a root directory.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    /// Creates a sink rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Sink for FsSink {
    async fn write(&self, path: &str, contents: &[u8]) -> Result<(), WriteError> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .context(CreateDirSnafu { path: parent })?;
        }
        tokio::fs::write(&target, contents)
            .await
            .context(WriteFileSnafu { path: &target })?;
        debug!(path = %target.display(), bytes = contents.len(), "wrote file");
        Ok(())
    }
}

/// Logs what would be written without touching the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSink;

impl Sink for DryRunSink {
    async fn write(&self, path: &str, contents: &[u8]) -> Result<(), WriteError> {
        info!(path = %path, bytes = contents.len(), "would write");
        Ok(())
    }
}

/// Writes every artifact, keeping at most `limit` writes in flight.
///
/// Returns the number of files written. The first failure stops the batch;
/// writes still in flight are aborted, and files already written stay.
///
/// # Errors
///
/// Returns the first write error encountered.
pub async fn write_all<S: Sink>(
    sink: &Arc<S>,
    artifacts: Vec<Artifact>,
    limit: usize,
) -> Result<usize, WriteError> {
    let limit = limit.max(1);
    let mut in_flight = JoinSet::new();
    let mut written = 0;

    for artifact in artifacts {
        if in_flight.len() >= limit
            && let Some(joined) = in_flight.join_next().await
        {
            joined.context(JoinSnafu)??;
            written += 1;
        }

        let sink = Arc::clone(sink);
        in_flight.spawn(async move {
            sink.write(&artifact.path, artifact.contents.as_bytes()).await
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        joined.context(JoinSnafu)??;
        written += 1;
    }

    Ok(written)
}
