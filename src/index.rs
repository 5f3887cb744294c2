// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! README and SUMMARY generation.
//!
//! Both files are folded from the sorted discussion list in one pass:
//!
//! - `README.md` is a table with one row per discussion.
//! - `SUMMARY.md` is a two-level outline grouped by creation month. Months
//!   appear in the order they are first met in the sorted list, which is
//!   category/recency order rather than calendar order.

use crate::config::RepoSlug;
use crate::discussion::Discussion;
use crate::renderer::{self, MonthKey, RenderOptions};
use std::collections::HashMap;
use std::fmt::Write;

/// Cell text for empty README columns.
const EMPTY_CELL: &str = "-";

/// One README table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeRow {
    /// Linked category, or `-`.
    pub category: String,
    /// Title linked to the document.
    pub article: String,
    /// Comma-joined label links, or `-`.
    pub labels: String,
    /// Formatted `updatedAt`.
    pub updated_at: String,
}

/// All SUMMARY entries for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    /// The month these entries were created in.
    pub key: MonthKey,
    /// `[title](link)` entries in encounter order.
    pub entries: Vec<String>,
}

/// Index data accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    /// README rows in list order.
    pub rows: Vec<ReadmeRow>,
    /// SUMMARY groups in first-seen month order.
    pub months: Vec<MonthGroup>,
}

/// Folds the sorted discussions into README rows and month groups.
#[must_use]
pub fn build_index(discussions: &[Discussion], repo: &RepoSlug, opts: &RenderOptions) -> Index {
    let mut index = Index::default();
    let mut month_positions: HashMap<MonthKey, usize> = HashMap::new();

    for discussion in discussions {
        let link = renderer::index_link(discussion, opts);
        let title = link_text(&renderer::display_title(discussion));
        let article = format!("[{title}]({link})");

        index.rows.push(ReadmeRow {
            category: category_cell(discussion, repo),
            article: article.clone(),
            labels: labels_cell(discussion, repo),
            updated_at: renderer::format_timestamp(&discussion.updated_at, opts),
        });

        let key = MonthKey::of(discussion, opts);
        let slot = *month_positions.entry(key).or_insert_with(|| {
            index.months.push(MonthGroup {
                key,
                entries: Vec::new(),
            });
            index.months.len() - 1
        });
        index.months[slot].entries.push(article);
    }

    index
}

/// Renders `README.md` with `intro` under the heading and `footer` after the table.
#[must_use]
pub fn render_readme(index: &Index, intro: &str, footer: &str) -> String {
    let mut out = String::from("# README\n\n");
    writeln!(out, "{intro}\n").unwrap();
    out.push_str("## Table of Contents\n\n");
    out.push_str("| Category | Article | Labels | Last Updated |\n");
    out.push_str("| --- | --- | --- | --- |\n");

    for row in &index.rows {
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            table_cell(&row.category),
            table_cell(&row.article),
            table_cell(&row.labels),
            table_cell(&row.updated_at),
        )
        .unwrap();
    }

    writeln!(out, "\n{footer}").unwrap();

    out
}

/// Renders `SUMMARY.md`.
#[must_use]
pub fn render_summary(index: &Index) -> String {
    let mut out = String::from("# SUMMARY\n\n");

    for group in &index.months {
        writeln!(out, "- [{key}]({key})", key = group.key).unwrap();
        for entry in &group.entries {
            writeln!(out, "  - {entry}").unwrap();
        }
    }

    out
}

fn category_cell(discussion: &Discussion, repo: &RepoSlug) -> String {
    discussion
        .category
        .as_ref()
        .filter(|c| !c.name.is_empty())
        .map_or_else(String::new, |c| {
            format!(
                "[{}]({}/categories/{}?discussions_q=)",
                link_text(&c.display_name()),
                repo.discussions_url(),
                encode(&c.slug)
            )
        })
}

fn labels_cell(discussion: &Discussion, repo: &RepoSlug) -> String {
    discussion
        .labels
        .iter()
        .map(|name| {
            format!(
                "[{}]({}?discussions_q=label%3A{})",
                link_text(name),
                repo.discussions_url(),
                encode(name)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Percent-encodes a query or path component.
fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Escapes brackets so the text cannot close a Markdown link early.
fn link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Escapes pipes and substitutes `-` for empty cells, so every row keeps four columns.
fn table_cell(text: &str) -> String {
    if text.trim().is_empty() {
        EMPTY_CELL.to_owned()
    } else {
        text.replace('|', "\\|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    const DISCUSSIONS: &str = "https://github.com/octo/blog/discussions";
    const FOOTER: &str = "See [GitHub Discussions](https://github.com/octo/blog/discussions).";

    fn opts() -> RenderOptions {
        RenderOptions {
            utc_offset: FixedOffset::east_opt(8 * 3600).unwrap(),
        }
    }

    fn repo() -> RepoSlug {
        "octo/blog".parse().unwrap()
    }

    fn readme_for(list: &[Discussion]) -> String {
        render_readme(&build_index(list, &repo(), &opts()), "Intro.", FOOTER)
    }

    fn discussion(number: u64, title: &str, created_at: &str) -> Discussion {
        Discussion::from_value(json!({
            "id": format!("D_{number}"),
            "number": number,
            "title": title,
            "authorAssociation": "OWNER",
            "createdAt": created_at,
            "updatedAt": "2024-05-01T00:00:00Z",
            "category": {
                "name": "Announcements",
                "emojiHTML": "<div>📣</div>",
                "slug": "announcements"
            },
            "labels": { "nodes": [{ "name": "rust" }, { "name": "good first" }] }
        }))
        .unwrap()
    }

    #[test]
    fn renders_readme_row_with_links() {
        let readme = readme_for(&[discussion(1, "Hello", "2024-03-01T00:00:00Z")]);

        assert!(readme.starts_with(
            "# README\n\nIntro.\n\n## Table of Contents\n\n\
             | Category | Article | Labels | Last Updated |\n| --- | --- | --- | --- |\n"
        ));
        let row = format!(
            "| [📣 Announcements]({DISCUSSIONS}/categories/announcements?discussions_q=) \
             | [Hello](2024/3/1_D_1.md) \
             | [rust]({DISCUSSIONS}?discussions_q=label%3Arust), \
             [good first]({DISCUSSIONS}?discussions_q=label%3Agood+first) \
             | 2024-05-01T08:00:00+08:00 |\n"
        );
        assert!(readme.contains(&row));
        assert!(readme.ends_with(&format!("\n{FOOTER}\n")));
    }

    #[test]
    fn missing_category_and_labels_render_placeholder_cells() {
        let mut d = discussion(1, "Hello", "2024-03-01T00:00:00Z");
        d.category = None;
        d.labels.clear();

        let readme = readme_for(&[d]);

        let row = "| - | [Hello](2024/3/1_D_1.md) | - | 2024-05-01T08:00:00+08:00 |\n";
        assert!(readme.contains(row));
    }

    #[test]
    fn escapes_pipes_in_cells() {
        let readme = readme_for(&[discussion(1, "a | b", "2024-03-01T00:00:00Z")]);

        assert!(readme.contains("[a \\| b](2024/3/1_D_1.md)"));
    }

    #[test]
    fn escapes_brackets_in_link_text() {
        let mut d = discussion(1, "Notes [draft]] v2", "2024-03-01T00:00:00Z");
        d.labels = vec!["a]b".into()];
        let index = build_index(&[d], &repo(), &opts());

        let article = "[Notes \\[draft\\]\\] v2](2024/3/1_D_1.md)";
        assert_eq!(index.rows[0].article, article);
        assert_eq!(
            index.rows[0].labels,
            format!("[a\\]b]({DISCUSSIONS}?discussions_q=label%3Aa%5Db)")
        );
        assert!(render_summary(&index).contains(&format!("  - {article}\n")));
    }

    #[test]
    fn empty_title_uses_default_in_index() {
        let list = vec![discussion(1, "", "2024-03-01T00:00:00Z")];
        let index = build_index(&list, &repo(), &opts());

        assert_eq!(index.rows[0].article, "[Unknown title](2024/3/1_D_1.md)");
    }

    #[test]
    fn same_month_shares_one_heading() {
        let list = vec![
            discussion(1, "One", "2024-03-01T00:00:00Z"),
            discussion(2, "Two", "2024-03-20T00:00:00Z"),
        ];
        let summary = render_summary(&build_index(&list, &repo(), &opts()));

        assert_eq!(
            summary,
            "# SUMMARY\n\n\
             - [2024/3](2024/3)\n\
             \x20 - [One](2024/3/1_D_1.md)\n\
             \x20 - [Two](2024/3/2_D_2.md)\n"
        );
    }

    #[test]
    fn months_follow_first_occurrence_not_calendar_order() {
        let list = vec![
            discussion(1, "Newer", "2024-05-01T00:00:00Z"),
            discussion(2, "Older", "2023-01-10T00:00:00Z"),
            discussion(3, "Newer again", "2024-05-09T00:00:00Z"),
        ];
        let index = build_index(&list, &repo(), &opts());

        let keys: Vec<String> = index.months.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, vec!["2024/5", "2023/1"]);
        assert_eq!(
            index.months[0].entries,
            vec!["[Newer](2024/5/1_D_1.md)", "[Newer again](2024/5/3_D_3.md)"]
        );

        let summary = render_summary(&index);
        assert_eq!(summary.matches("- [2024/5](2024/5)").count(), 1);
    }

    #[test]
    fn empty_list_renders_headers_only() {
        let index = build_index(&[], &repo(), &opts());

        assert_eq!(render_summary(&index), "# SUMMARY\n\n");
        assert!(readme_for(&[]).contains("| --- | --- | --- | --- |\n\nSee"));
    }
}
