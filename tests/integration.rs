// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! End-to-end tests for discussions2md export runs.

use discussions2md::config::ExportOptions;
use discussions2md::export::export;
use discussions2md::sink::{DryRunSink, FsSink};
use discussions2md::source::{GithubSource, SnapshotSource};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn node(number: u64, slug: Option<&str>, created_at: &str, updated_at: &str) -> Value {
    let category = slug.map_or(Value::Null, |s| {
        json!({
            "id": "DIC",
            "name": s,
            "emoji": ":star:",
            "emojiHTML": "<div>⭐</div>",
            "slug": s
        })
    });
    json!({
        "id": format!("D_{number}"),
        "labels": { "nodes": [{ "id": "LA", "name": "notes" }] },
        "category": category,
        "number": number,
        "title": format!("Post {number}"),
        "body": format!("Body of post {number}."),
        "author": { "login": "octocat" },
        "authorAssociation": "OWNER",
        "createdAt": created_at,
        "updatedAt": updated_at,
        "url": format!("https://github.com/octo/blog/discussions/{number}")
    })
}

fn sample_nodes() -> Vec<Value> {
    vec![
        node(1, Some("show-and-tell"), "2024-01-05T00:00:00Z", "2024-06-01T00:00:00Z"),
        node(2, Some("announcements"), "2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z"),
        node(3, None, "2024-01-20T00:00:00Z", "2024-01-21T00:00:00Z"),
    ]
}

fn write_snapshots(dir: &Path, nodes: &[Value]) {
    for node in nodes {
        let name = format!("{}_{}.json", node["number"], node["id"].as_str().unwrap());
        fs::write(dir.join(name), serde_json::to_string_pretty(node).unwrap()).unwrap();
    }
}

/// Reads every file under `root` keyed by its relative path.
fn read_tree(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            (rel, fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

async fn export_snapshots(input: &Path, output: &Path) {
    let mut opts = ExportOptions::new("octo/blog".parse().unwrap()).unwrap();
    opts.output_dir = output.to_path_buf();
    let mut source = SnapshotSource::open(input).unwrap();
    let sink = Arc::new(FsSink::new(output));

    export(&mut source, &sink, &opts).await.unwrap();
}

/// Produces the full documentation layout from snapshots.
#[tokio::test]
async fn produces_expected_layout() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_snapshots(input.path(), &sample_nodes());

    export_snapshots(input.path(), output.path()).await;

    let tree = read_tree(output.path());
    let paths: Vec<&str> = tree.keys().map(String::as_str).collect();
    assert_eq!(
        paths,
        vec![
            "README.md",
            "SUMMARY.md",
            "discussions/1_D_1.json",
            "discussions/2_D_2.json",
            "discussions/3_D_3.json",
            "markdowns/2024/1/1_D_1.md",
            "markdowns/2024/1/3_D_3.md",
            "markdowns/2024/3/2_D_2.md",
        ]
    );

    assert_eq!(
        tree["SUMMARY.md"],
        "# SUMMARY\n\n\
         - [2024/3](2024/3)\n\
         \x20 - [Post 2](2024/3/2_D_2.md)\n\
         - [2024/1](2024/1)\n\
         \x20 - [Post 1](2024/1/1_D_1.md)\n\
         \x20 - [Post 3](2024/1/3_D_3.md)\n"
    );

    let readme = &tree["README.md"];
    let rows: Vec<&str> = readme
        .lines()
        .filter(|l| l.starts_with("| [") || l.starts_with("| -"))
        .collect();
    assert_eq!(rows.len(), 4, "header separator plus three rows");
    assert!(rows[1].contains("[Post 2]"));
    assert!(rows[2].contains("[Post 1]"));
    assert!(rows[3].starts_with("| - | [Post 3](2024/1/3_D_3.md) |"));

    let doc = &tree["markdowns/2024/3/2_D_2.md"];
    assert!(doc.starts_with("---\nauthor: octocat\ncategory: ⭐ announcements\nlabels: notes\n"));
    assert!(doc.ends_with("\n# Post 2\n\nBody of post 2.\n"));
}

/// Running twice on the same input yields byte-identical output.
#[tokio::test]
async fn export_is_deterministic() {
    let input = tempfile::tempdir().unwrap();
    write_snapshots(input.path(), &sample_nodes());

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    export_snapshots(input.path(), first.path()).await;
    export_snapshots(input.path(), second.path()).await;

    assert_eq!(read_tree(first.path()), read_tree(second.path()));
}

/// Snapshots written by one run re-render to the same documents.
#[tokio::test]
async fn snapshots_round_trip_through_replay() {
    let input = tempfile::tempdir().unwrap();
    write_snapshots(input.path(), &sample_nodes());

    let first = tempfile::tempdir().unwrap();
    export_snapshots(input.path(), first.path()).await;

    let second = tempfile::tempdir().unwrap();
    export_snapshots(&first.path().join("discussions"), second.path()).await;

    assert_eq!(read_tree(first.path()), read_tree(second.path()));
}

/// Dry runs leave the output directory untouched.
#[tokio::test]
async fn dry_run_leaves_output_empty() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_snapshots(input.path(), &sample_nodes());

    let opts = ExportOptions::new("octo/blog".parse().unwrap()).unwrap();
    let mut source = SnapshotSource::open(input.path()).unwrap();
    let summary = export(&mut source, &Arc::new(DryRunSink), &opts).await.unwrap();

    assert_eq!(summary.files_written, 8);
    assert!(read_tree(output.path()).is_empty());
}

/// Edits made during pagination collapse into the latest version.
#[tokio::test]
async fn exports_from_graphql_with_duplicates_across_pages() {
    let server = MockServer::start().await;

    let stale = node(7, None, "2024-02-01T00:00:00Z", "2024-02-01T00:00:00Z");
    let mut fresh = node(7, None, "2024-02-01T00:00:00Z", "2024-02-03T00:00:00Z");
    fresh["title"] = json!("Edited title");
    let mut outsider = node(8, None, "2024-02-01T00:00:00Z", "2024-02-01T00:00:00Z");
    outsider["authorAssociation"] = json!("CONTRIBUTOR");

    let page = |nodes: Vec<Value>, cursor: Option<&str>, more: bool| {
        json!({ "data": { "repository": { "discussions": {
            "pageInfo": { "endCursor": cursor, "startCursor": null, "hasNextPage": more },
            "nodes": nodes
        }}}})
    };

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "after": null } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![stale, outsider], Some("p1"), true)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "after": "p1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![fresh], None, false)))
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let mut opts = ExportOptions::new("octo/blog".parse().unwrap()).unwrap();
    opts.output_dir = output.path().to_path_buf();
    let mut source = GithubSource::new(server.uri(), "token", opts.repository.clone()).unwrap();

    let summary = export(&mut source, &Arc::new(FsSink::new(output.path())), &opts)
        .await
        .unwrap();

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.exported, 1);
    let doc = fs::read_to_string(output.path().join("markdowns/2024/2/7_D_7.md")).unwrap();
    assert!(doc.contains("# Edited title"));
    assert!(doc.contains("updatedAt: \"2024-02-03T08:00:00+08:00\""));
    assert!(!output.path().join("discussions/8_D_8.json").exists());
}

/// A replayed snapshot whose node id is a path cannot write outside the output root.
#[tokio::test]
async fn replay_rejects_node_ids_that_are_paths() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut hostile = node(1, None, "2024-03-01T00:00:00Z", "2024-03-01T00:00:00Z");
    hostile["id"] = json!("../../escaped");
    fs::write(input.path().join("1_hostile.json"), hostile.to_string()).unwrap();

    let opts = ExportOptions::new("octo/blog".parse().unwrap()).unwrap();
    let mut source = SnapshotSource::open(input.path()).unwrap();
    let sink = Arc::new(FsSink::new(output.path().join("site")));

    let err = export(&mut source, &sink, &opts).await.unwrap_err();

    assert!(err.to_string().contains("../../escaped"), "{err}");
    assert!(read_tree(output.path()).is_empty());
}
