use std::collections::HashSet;

use crate::models::{CommitDiff, CommitList};

/// Splits two commit listings into the commits unique to each side.
///
/// Each side keeps its own relative order and its duplicates; membership is
/// checked against a hash set of the opposite side, so the whole thing is
/// linear in `|a| + |b|`.
pub fn diff_commits(
    commits_a: &[String],
    revision_a: &str,
    commits_b: &[String],
    revision_b: &str,
) -> CommitDiff {
    CommitDiff::new(
        revision_a.to_string(),
        unique_to(commits_a, commits_b),
        revision_b.to_string(),
        unique_to(commits_b, commits_a),
    )
}

fn unique_to(side: &[String], other: &[String]) -> CommitList {
    let other: HashSet<&str> = other.iter().map(String::as_str).collect();
    side.iter()
        .filter(|sha| !other.contains(sha.as_str()))
        .cloned()
        .collect()
}
