//! Commit collection

use crate::cherry_pick::retry::with_retry;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::Commit;
use tracing::debug;

/// Fetch every commit in `shas`, preserving order
///
/// Fails with [`Error::EmptyInput`] for an empty list and
/// [`Error::NotFound`] for the first sha the host cannot resolve.
pub async fn collect_commits(platform: &dyn PlatformService, shas: &[String]) -> Result<Vec<Commit>> {
    if shas.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut commits = Vec::with_capacity(shas.len());
    for sha in shas {
        let commit = with_retry("get_commit", || platform.get_commit(sha))
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::NotFound(format!("commit {sha}")),
                other => other,
            })?;
        debug!(sha = %commit.sha, parents = commit.parents.len(), "collected commit");
        commits.push(commit);
    }
    Ok(commits)
}
