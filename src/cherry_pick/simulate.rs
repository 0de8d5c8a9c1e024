//! Merge simulation through the host's merge endpoint
//!
//! The host only knows how to merge, so each pick is phrased as a merge whose
//! merge base is the picked commit's parent: the scratch branch is first
//! pointed at a *sibling* commit that carries the current tip's tree on top of
//! that parent. Merging the picked commit into it then applies exactly the
//! commit's own diff to the tip tree, and the resulting tree is all we keep.

use crate::cherry_pick::retry::with_retry;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{Commit, MergeOutcome, MergeResult, NewCommit};
use tracing::debug;

/// Scratch commit with `tip_tree` as its tree and `commit`'s first parent
///
/// Root commits get a parentless sibling.
pub fn sibling_commit(commit: &Commit, tip_tree: &str) -> NewCommit {
    NewCommit {
        message: format!("sibling of {}", commit.sha),
        tree: tip_tree.to_string(),
        parents: commit
            .first_parent()
            .map(|p| vec![p.to_string()])
            .unwrap_or_default(),
        author: commit.author.clone(),
        committer: commit.committer.clone(),
    }
}

/// Ask the host whether `commit` applies on a tree equal to `tip_tree`
///
/// Leaves `temp` pointing at the host's merge commit (or the sibling when
/// there was nothing to merge). A conflict aborts with [`Error::Conflict`].
pub async fn simulate_merge(
    platform: &dyn PlatformService,
    temp: &str,
    tip_tree: &str,
    commit: &Commit,
) -> Result<MergeResult> {
    let sibling = sibling_commit(commit, tip_tree);
    let sibling_sha = with_retry("create_commit", || platform.create_commit(&sibling)).await?;
    with_retry("update_ref", || platform.update_ref(temp, &sibling_sha, true)).await?;
    debug!(commit = %commit.sha, sibling = %sibling_sha, "pointed temp branch at sibling");

    let message = format!("Merge {} into {temp}", commit.sha);
    match with_retry("merge", || platform.merge(temp, &commit.sha, &message)).await? {
        MergeOutcome::Clean { sha, tree_sha } => {
            debug!(commit = %commit.sha, merge = %sha, tree = %tree_sha, "merge clean");
            Ok(MergeResult {
                merge_sha: sha,
                tree_sha,
            })
        }
        MergeOutcome::Conflict => {
            debug!(commit = %commit.sha, "merge conflict");
            Err(Error::Conflict {
                commit: commit.sha.clone(),
            })
        }
        // Either the pick is empty or a retried merge already landed;
        // in both cases the branch tip holds the tree we want.
        MergeOutcome::NothingToMerge => {
            let tip = with_retry("get_ref", || platform.get_ref(temp)).await?;
            let tip_commit = with_retry("get_commit", || platform.get_commit(&tip.sha)).await?;
            debug!(commit = %commit.sha, tip = %tip.sha, "nothing to merge");
            Ok(MergeResult {
                merge_sha: tip.sha,
                tree_sha: tip_commit.tree_sha,
            })
        }
    }
}
