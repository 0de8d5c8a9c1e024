//! Commit replay
//!
//! Folds the ordered commits into a linear chain on the scratch branch. Each
//! step only depends on the previous step's tip, so the fold accumulator is
//! the whole state.

use crate::cherry_pick::progress::ProgressCallback;
use crate::cherry_pick::retry::with_retry;
use crate::cherry_pick::simulate::simulate_merge;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{Commit, NewCommit, ReplayedCommit, RequestState};
use futures_util::{TryStreamExt, stream};
use tracing::debug;

/// Accumulator threaded through the replay fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayState {
    /// Commit the next replayed commit will use as its parent
    pub tip_sha: String,
    /// Tree of `tip_sha`
    pub tip_tree: String,
    /// Commits written so far, in order
    pub replayed: Vec<ReplayedCommit>,
}

impl ReplayState {
    /// Start from the target branch's tip
    pub fn new(tip_sha: impl Into<String>, tip_tree: impl Into<String>) -> Self {
        Self {
            tip_sha: tip_sha.into(),
            tip_tree: tip_tree.into(),
            replayed: Vec::new(),
        }
    }
}

/// Message for the replayed copy of `commits[index]`
///
/// A single pick keeps its message. In a multi-commit pick, intermediate
/// commits are labelled `sibling of <first sha>` and the last one gets
/// `<its message> of <first sha>`.
pub fn replay_message(index: usize, commits: &[Commit]) -> String {
    match commits {
        [] => String::new(),
        [only] => only.message.clone(),
        [first, .., last] if index + 1 == commits.len() => {
            format!("{} of {}", last.message, first.sha)
        }
        [first, ..] => format!("sibling of {}", first.sha),
    }
}

/// Commit object replaying `source` with the merged tree on top of `parent`
pub fn build_replay_commit(source: &Commit, tree_sha: &str, parent: &str, message: String) -> NewCommit {
    NewCommit {
        message,
        tree: tree_sha.to_string(),
        parents: vec![parent.to_string()],
        author: source.author.clone(),
        committer: source.committer.clone(),
    }
}

/// Replay `commits[index]` onto `state.tip_sha` and advance `temp` to it
pub async fn replay_step(
    platform: &dyn PlatformService,
    temp: &str,
    commits: &[Commit],
    index: usize,
    mut state: ReplayState,
    progress: &dyn ProgressCallback,
) -> Result<ReplayState> {
    let source = commits
        .get(index)
        .ok_or_else(|| Error::Internal(format!("no commit at replay index {index}")))?;

    progress.on_state(RequestState::Replaying(index)).await;
    progress
        .on_message(&format!("Applying {} {}", short_sha(&source.sha), source.summary()))
        .await;

    let merge = simulate_merge(platform, temp, &state.tip_tree, source).await?;

    let new_commit = build_replay_commit(
        source,
        &merge.tree_sha,
        &state.tip_sha,
        replay_message(index, commits),
    );
    let sha = with_retry("create_commit", || platform.create_commit(&new_commit)).await?;
    // The branch sits on the host's merge commit, so this must be forced
    with_retry("update_ref", || platform.update_ref(temp, &sha, true)).await?;
    debug!(source = %source.sha, replayed = %sha, parent = %state.tip_sha, "replayed commit");

    state.replayed.push(ReplayedCommit {
        sha: sha.clone(),
        source_sha: source.sha.clone(),
        parent: state.tip_sha,
        tree_sha: merge.tree_sha.clone(),
        message: new_commit.message,
    });
    state.tip_sha = sha;
    state.tip_tree = merge.tree_sha;
    Ok(state)
}

/// Replay every commit in order, starting from `initial`
pub async fn replay_commits(
    platform: &dyn PlatformService,
    temp: &str,
    commits: &[Commit],
    initial: ReplayState,
    progress: &dyn ProgressCallback,
) -> Result<ReplayState> {
    stream::iter((0..commits.len()).map(Ok::<_, Error>))
        .try_fold(initial, move |state, index| {
            replay_step(platform, temp, commits, index, state, progress)
        })
        .await
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
