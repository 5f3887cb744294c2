// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for discussions2md.
//!
//! Meant to run unattended, e.g. from a scheduled GitHub Actions workflow:
//! the repository and token come from `GITHUB_REPOSITORY` and
//! `GITHUB_TOKEN`, and every flag is optional.

use discussions2md::config::{self, ConfigError, ExportOptions, RepoSlug};
use discussions2md::export::{self, ExportError};
use discussions2md::sink::{DryRunSink, FsSink};
use discussions2md::source::{GITHUB_GRAPHQL_URL, GithubSource, SnapshotSource, SourceError};
use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Cli {
    output: Option<PathBuf>,
    repo: Option<String>,
    page_size: Option<u32>,
    concurrency: Option<usize>,
    utc_offset: Option<i32>,
    from_snapshots: Option<PathBuf>,
    dry_run: bool,
    quiet: bool,
    verbose: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("invalid configuration: {source}"))]
    Config { source: ConfigError },

    #[snafu(display("failed to open discussion source: {source}"))]
    OpenSource { source: SourceError },

    #[snafu(display("{source}"))]
    Export { source: ExportError },
}

fn print_help() {
    println!(
        "\
{name} {version}
Export GitHub Discussions to JSON snapshots and Markdown documents

Usage: {name} [OPTIONS]

Environment:
  GITHUB_TOKEN              Token used for the GraphQL API
  GITHUB_REPOSITORY         Repository to export, as OWNER/REPO
  GITHUB_GRAPHQL_URL        GraphQL endpoint (default: {endpoint})
  RUST_LOG                  Log filter, overrides -q/-v

Options:
  -o, --output <DIR>        Output directory (default: .)
      --repo <OWNER/REPO>   Repository to export (overrides GITHUB_REPOSITORY)
      --page-size <N>       Discussions per request, 1-{max_page} (default: {page})
      --concurrency <N>     Files written at once (default: {concurrency})
      --utc-offset <HOURS>  Offset for dates and paths (default: {offset})
      --from-snapshots <DIR>
                            Re-render from exported JSON snapshots instead of the API
  -n, --dry-run             Log what would be written without writing
  -q, --quiet               Only log warnings and errors
  -v, --verbose             Log every file written
  -h, --help                Print help
  -V, --version             Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        endpoint = GITHUB_GRAPHQL_URL,
        max_page = config::MAX_PAGE_SIZE,
        page = config::DEFAULT_PAGE_SIZE,
        concurrency = config::DEFAULT_CONCURRENCY,
        offset = config::DEFAULT_UTC_OFFSET_HOURS,
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    let mut cli = Cli {
        output: None,
        repo: None,
        page_size: None,
        concurrency: None,
        utc_offset: None,
        from_snapshots: None,
        dry_run: false,
        quiet: false,
        verbose: false,
    };

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => cli.output = Some(parser.value()?.parse()?),
            Long("repo") => cli.repo = Some(parser.value()?.parse()?),
            Long("page-size") => cli.page_size = Some(parser.value()?.parse()?),
            Long("concurrency") => cli.concurrency = Some(parser.value()?.parse()?),
            Long("utc-offset") => cli.utc_offset = Some(parser.value()?.parse()?),
            Long("from-snapshots") => cli.from_snapshots = Some(parser.value()?.parse()?),
            Short('n') | Long("dry-run") => cli.dry_run = true,
            Short('q') | Long("quiet") => cli.quiet = true,
            Short('v') | Long("verbose") => cli.verbose = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(cli)
}

fn init_tracing(cli: &Cli) {
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
        .with_target(false)
        .init();
}

/// Builds export options from defaults, the environment, and flags.
fn make_export_options(cli: &Cli) -> Result<ExportOptions, ConfigError> {
    let repo = cli
        .repo
        .clone()
        .or_else(|| env_var("GITHUB_REPOSITORY"))
        .ok_or(ConfigError::MissingRepository)?;
    let repository: RepoSlug = repo.parse()?;

    let mut opts = ExportOptions::new(repository)?;
    if let Some(output) = &cli.output {
        opts.output_dir.clone_from(output);
    }
    if let Some(page_size) = cli.page_size {
        opts.page_size = page_size;
    }
    if let Some(concurrency) = cli.concurrency {
        opts.concurrency = concurrency;
    }
    if let Some(hours) = cli.utc_offset {
        opts.render.utc_offset = config::utc_offset(hours)?;
    }
    opts.validate()?;

    Ok(opts)
}

/// Reads a non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_tracing(&cli);

    let result = run(&cli).await;
    if let Err(err) = &result {
        error!("{err}");
    }
    result
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let opts = make_export_options(cli).context(ConfigSnafu)?;
    info!(
        repository = %opts.repository,
        output = %opts.output_dir.display(),
        "exporting discussions"
    );

    if let Some(dir) = &cli.from_snapshots {
        let mut source = SnapshotSource::open(dir).context(OpenSourceSnafu)?;
        info!(files = source.len(), dir = %dir.display(), "replaying snapshots");
        export_to(&mut source, &opts, cli.dry_run).await
    } else {
        let token = env_var("GITHUB_TOKEN")
            .ok_or(ConfigError::MissingToken)
            .context(ConfigSnafu)?;
        let endpoint =
            env_var("GITHUB_GRAPHQL_URL").unwrap_or_else(|| GITHUB_GRAPHQL_URL.to_owned());
        let mut source = GithubSource::new(endpoint, token, opts.repository.clone())
            .context(OpenSourceSnafu)?;
        export_to(&mut source, &opts, cli.dry_run).await
    }
}

async fn export_to<P>(source: &mut P, opts: &ExportOptions, dry_run: bool) -> Result<(), Error>
where
    P: discussions2md::source::PagedSource,
{
    let result = if dry_run {
        export::export(source, &Arc::new(DryRunSink), opts).await
    } else {
        export::export(source, &Arc::new(FsSink::new(&opts.output_dir)), opts).await
    };
    let summary = result.context(ExportSnafu)?;

    info!(
        fetched = summary.fetched,
        exported = summary.exported,
        files = summary.files_written,
        "Done. Total discussions: {}",
        summary.exported
    );
    Ok(())
}
