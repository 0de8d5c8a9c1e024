//! Pull request naming and text
//!
//! Everything here is a pure function of the selected commits and the
//! target, so a repeated request lands on the same head branch.

use crate::types::{Commit, PullRequestDraft};
use md5::{Digest, Md5};

/// First six hex digits of the MD5 of the comma-joined SHAs
pub fn short_hash(shas: &[String]) -> String {
    let digest = Md5::digest(shas.join(",").as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(6);
    hex
}

/// Head branch for a cherry-pick pull request
pub fn pull_request_branch_name(shas: &[String], target: &str) -> String {
    format!("cherry-pick-{}-{target}", short_hash(shas))
}

/// Build the pull request for `commits` against `target`
///
/// The title is the first commit's summary unless overridden. The body holds
/// the full messages of the remaining commits followed by a
/// `Cherry-picked ...` line listing every commit's summary.
pub fn compose_pull_request(
    commits: &[Commit],
    target: &str,
    title_override: Option<&str>,
) -> PullRequestDraft {
    let shas: Vec<String> = commits.iter().map(|c| c.sha.clone()).collect();

    let title = title_override
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(
            || commits.first().map(Commit::summary).unwrap_or_default().to_string(),
            ToString::to_string,
        );

    let rest = commits
        .iter()
        .skip(1)
        .map(|c| c.message.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let summaries = commits
        .iter()
        .map(Commit::summary)
        .collect::<Vec<_>>()
        .join(", ");

    PullRequestDraft {
        head: pull_request_branch_name(&shas, target),
        base: target.to_string(),
        title,
        body: format!("{rest}\n\nCherry-picked {summaries}"),
    }
}
