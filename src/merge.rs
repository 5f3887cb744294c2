// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Deduplication and ordering of fetched discussions.
//!
//! Paginating a live repository can return the same discussion more than
//! once when it is edited mid-run. [`deduplicate`] collapses those into one
//! canonical record per identity and [`sort_discussions`] puts the result in
//! the order the index files list them.

use crate::discussion::{Discussion, Identity};
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

/// Keeps one owner-authored record per identity.
///
/// Records not written by the repository owner are dropped. For each
/// identity, an incoming record replaces the stored one unless the stored
/// one was updated strictly later, so a tie goes to whichever record came
/// last in `records`.
///
/// The result lists identities in the order they were first seen.
#[must_use]
pub fn deduplicate<I>(records: I) -> Vec<Discussion>
where
    I: IntoIterator<Item = Discussion>,
{
    let mut canonical: Vec<Discussion> = Vec::new();
    let mut positions: HashMap<Identity, usize> = HashMap::new();

    for record in records {
        if !record.is_owned() {
            continue;
        }

        match positions.get(&record.identity) {
            Some(&slot) if canonical[slot].updated_at > record.updated_at => {}
            Some(&slot) => canonical[slot] = record,
            None => {
                positions.insert(record.identity.clone(), canonical.len());
                canonical.push(record);
            }
        }
    }

    canonical
}

/// Sorts discussions by category preference, then most recently updated first.
///
/// `category_order` lists preferred category slugs; discussions in other
/// categories, or without one, come after all listed categories. The sort is
/// stable, so full ties keep their input order.
pub fn sort_discussions(discussions: &mut [Discussion], category_order: &[String]) {
    discussions.sort_by(|a, b| compare(a, b, category_order));
}

fn compare(a: &Discussion, b: &Discussion, category_order: &[String]) -> Ordering {
    let key = |d: &Discussion| (category_rank(d, category_order), Reverse(d.updated_at));
    key(a).cmp(&key(b))
}

fn category_rank(discussion: &Discussion, category_order: &[String]) -> usize {
    discussion
        .category_slug()
        .and_then(|slug| category_order.iter().position(|s| s == slug))
        .unwrap_or(category_order.len())
}
