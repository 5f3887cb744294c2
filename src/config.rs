// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Export configuration.
//!
//! Values start from the defaults below, then the environment (as a GitHub
//! Actions workflow provides it), then command-line flags.

use crate::renderer::RenderOptions;
use chrono::FixedOffset;
use snafu::{ensure, prelude::*};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Discussions requested per GraphQL page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page GitHub's GraphQL API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Writes allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Hours east of UTC used for paths and timestamps.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Category slugs listed first, in this order.
pub const DEFAULT_CATEGORY_ORDER: [&str; 2] = ["announcements", "show-and-tell"];

/// Introduction line under the README heading.
pub const DEFAULT_README_INTRO: &str = "Just a repository for blogs. :)";

/// Error type for invalid configuration values.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The repository is not in `owner/repo` form.
    #[snafu(display("invalid repository {value:?}: expected OWNER/REPO"))]
    InvalidRepository {
        /// The rejected value.
        value: String,
    },

    /// No repository was given by flag or environment.
    #[snafu(display("no repository given: set GITHUB_REPOSITORY or pass --repo"))]
    MissingRepository,

    /// No token is available for the GitHub API.
    #[snafu(display("GITHUB_TOKEN is required to fetch discussions"))]
    MissingToken,

    /// The page size is outside `1..=100`.
    #[snafu(display("page size must be 1-{MAX_PAGE_SIZE}, got {value}"))]
    InvalidPageSize {
        /// The rejected value.
        value: u32,
    },

    /// The concurrency limit is zero.
    #[snafu(display("concurrency must be at least 1"))]
    InvalidConcurrency,

    /// The UTC offset is not a valid fixed offset.
    #[snafu(display("utc offset must be between -23 and 23 hours, got {hours}"))]
    InvalidUtcOffset {
        /// The rejected value.
        hours: i32,
    },
}

/// A repository in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Owning user or organization.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoSlug {
    /// Returns the repository's Discussions page.
    #[must_use]
    pub fn discussions_url(&self) -> String {
        format!("https://github.com/{}/{}/discussions", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .trim()
            .split_once('/')
            .context(InvalidRepositorySnafu { value: s })?;
        ensure!(
            !owner.is_empty() && !name.is_empty() && !name.contains('/'),
            InvalidRepositorySnafu { value: s }
        );
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything an export run needs besides its source and sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Repository whose discussions are exported.
    pub repository: RepoSlug,
    /// Directory that receives the output tree.
    pub output_dir: PathBuf,
    /// Discussions requested per page.
    pub page_size: u32,
    /// Writes allowed in flight at once.
    pub concurrency: usize,
    /// Category slugs listed first, in this order.
    pub category_order: Vec<String>,
    /// Rendering settings.
    pub render: RenderOptions,
    /// Line under the README heading.
    pub readme_intro: String,
    /// Line after the README table.
    pub readme_footer: String,
}

impl ExportOptions {
    /// Creates options for `repository` with every other value at its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the default UTC offset is rejected by chrono.
    pub fn new(repository: RepoSlug) -> Result<Self, ConfigError> {
        Ok(Self {
            readme_intro: DEFAULT_README_INTRO.to_owned(),
            readme_footer: default_readme_footer(&repository),
            repository,
            output_dir: PathBuf::from("."),
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            category_order: DEFAULT_CATEGORY_ORDER.map(str::to_owned).to_vec(),
            render: RenderOptions {
                utc_offset: utc_offset(DEFAULT_UTC_OFFSET_HOURS)?,
            },
        })
    }

    /// Checks values that flags or the environment may have set.
    ///
    /// # Errors
    ///
    /// Returns an error for a page size outside `1..=100` or a zero concurrency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            (1..=MAX_PAGE_SIZE).contains(&self.page_size),
            InvalidPageSizeSnafu {
                value: self.page_size
            }
        );
        ensure!(self.concurrency > 0, InvalidConcurrencySnafu);
        Ok(())
    }
}

/// Footer linking back to the repository's Discussions page.
#[must_use]
pub fn default_readme_footer(repository: &RepoSlug) -> String {
    format!(
        "Browse and comment on these posts in [GitHub Discussions]({}).",
        repository.discussions_url()
    )
}

/// Converts whole hours east of UTC into a fixed offset.
///
/// # Errors
///
/// Returns an error if `hours` is outside `-23..=23`.
pub fn utc_offset(hours: i32) -> Result<FixedOffset, ConfigError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .context(InvalidUtcOffsetSnafu { hours })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_slug() {
        let slug: RepoSlug = "octo/blog".parse().unwrap();

        assert_eq!(slug.owner, "octo");
        assert_eq!(slug.name, "blog");
        assert_eq!(slug.to_string(), "octo/blog");
        assert_eq!(slug.discussions_url(), "https://github.com/octo/blog/discussions");
    }

    #[test]
    fn rejects_malformed_repository_slugs() {
        for value in ["", "octo", "/blog", "octo/", "octo/blog/extra"] {
            assert!(
                matches!(
                    value.parse::<RepoSlug>(),
                    Err(ConfigError::InvalidRepository { .. })
                ),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn defaults_match_published_layout() {
        let opts = ExportOptions::new("octo/blog".parse().unwrap()).unwrap();

        assert_eq!(opts.page_size, 10);
        assert_eq!(opts.category_order, vec!["announcements", "show-and-tell"]);
        assert_eq!(opts.render.utc_offset.local_minus_utc(), 8 * 3600);
        assert_eq!(opts.readme_intro, "Just a repository for blogs. :)");
        assert_eq!(
            opts.readme_footer,
            "Browse and comment on these posts in \
             [GitHub Discussions](https://github.com/octo/blog/discussions)."
        );
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn validates_page_size_and_concurrency() {
        let mut opts = ExportOptions::new("octo/blog".parse().unwrap()).unwrap();

        opts.page_size = 0;
        assert!(matches!(opts.validate(), Err(ConfigError::InvalidPageSize { value: 0 })));

        opts.page_size = 101;
        assert!(opts.validate().is_err());

        opts.page_size = 100;
        opts.concurrency = 0;
        assert!(matches!(opts.validate(), Err(ConfigError::InvalidConcurrency)));
    }

    #[test]
    fn converts_utc_offsets() {
        assert_eq!(utc_offset(-5).unwrap().local_minus_utc(), -5 * 3600);
        assert!(matches!(
            utc_offset(24),
            Err(ConfigError::InvalidUtcOffset { hours: 24 })
        ));
    }
}
