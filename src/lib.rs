// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Export GitHub Discussions to a static documentation set.
//!
//! This crate fetches a repository's discussions and turns them into files
//! that can be committed next to the code or published as a book.
//!
//! # Overview
//!
//! An export run:
//!
//! 1. Reads every page of discussions from a [`source::PagedSource`]
//! 2. Keeps the latest owner-written version of each discussion
//! 3. Orders them by category preference, then most recently updated
//! 4. Renders a JSON snapshot and a Markdown document per discussion, plus
//!    `README.md` and `SUMMARY.md`
//! 5. Writes everything through a [`sink::Sink`]
//!
//! # Example
//!
//! ```no_run
//! use discussions2md::config::ExportOptions;
//! use discussions2md::export::export;
//! use discussions2md::sink::FsSink;
//! use discussions2md::source::{GithubSource, GITHUB_GRAPHQL_URL};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let opts = ExportOptions::new("octo/blog".parse()?)?;
//! let mut source = GithubSource::new(GITHUB_GRAPHQL_URL, "token", opts.repository.clone())?;
//! let sink = Arc::new(FsSink::new(&opts.output_dir));
//!
//! let summary = export(&mut source, &sink, &opts).await?;
//! println!("exported {} discussions", summary.exported);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`discussion`]: typed view of a discussion node
//! - [`source`]: paged sources (GitHub GraphQL, snapshot directory)
//! - [`merge`]: deduplication and ordering
//! - [`renderer`]: snapshots, documents, and their paths
//! - [`index`]: README and SUMMARY
//! - [`sink`]: output destinations and batched writes
//! - [`config`]: export options
//! - [`export`]: the end-to-end run

#![deny(missing_docs)]

pub mod config;
pub mod discussion;
pub mod export;
pub mod index;
pub mod merge;
pub mod renderer;
pub mod sink;
pub mod source;
