//! Publishing replayed commits

use crate::cherry_pick::retry::with_retry;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{PullRequest, PullRequestDraft};
use tracing::{debug, info};

/// Move `target` to `final_sha`
///
/// Fails with [`Error::TargetMoved`] if `target` no longer points at
/// `expected_base`, the tip the replay started from.
pub async fn publish_direct(
    platform: &dyn PlatformService,
    target: &str,
    expected_base: &str,
    final_sha: &str,
) -> Result<String> {
    let current = with_retry("get_ref", || platform.get_ref(target)).await?;
    if current.sha != expected_base {
        return Err(Error::TargetMoved {
            branch: target.to_string(),
            expected: expected_base.to_string(),
            actual: current.sha,
        });
    }

    let updated = with_retry("update_ref", || platform.update_ref(target, final_sha, true)).await?;
    info!(branch = target, sha = %updated.sha, "updated target branch");
    Ok(updated.sha)
}

/// Open the pull request described by `draft`
///
/// If the host reports that a PR for this head already exists (a concurrent
/// identical request won the race), that PR is returned instead.
pub async fn open_pull_request(
    platform: &dyn PlatformService,
    draft: &PullRequestDraft,
) -> Result<PullRequest> {
    match with_retry("create_pull_request", || platform.create_pull_request(draft)).await {
        Ok(pr) => {
            info!(number = pr.number, head = %draft.head, "opened pull request");
            Ok(pr)
        }
        Err(Error::AlreadyExists { name, existing_sha }) => {
            debug!(head = %draft.head, "pull request already exists, looking it up");
            with_retry("find_existing_pr", || platform.find_existing_pr(&draft.head))
                .await?
                .ok_or(Error::AlreadyExists { name, existing_sha })
        }
        Err(e) => Err(e),
    }
}
