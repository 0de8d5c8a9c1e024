//! Remote cherry-pick engine
//!
//! Replays commits onto a branch using nothing but the host's Git Data API:
//!
//! 1. Collect - fetch the selected commits (read-only, fails before any ref exists)
//! 2. Temp branch - create the scratch branch at the target's tip
//! 3. Replay - per commit, let the host merge decide the tree, then write a
//!    single-parent commit on top of the previous one
//! 4. Publish - move the target branch, or open a pull request from the
//!    scratch branch
//! 5. Cleanup - delete the scratch branch unless it became the PR head
//!
//! Every host call goes through [`with_retry`], which retries transient
//! failures exactly once.

mod cleanup;
mod collect;
mod compose;
mod engine;
mod progress;
mod publish;
mod replay;
mod retry;
mod simulate;
mod temp_branch;

pub use cleanup::cleanup_temp_branch;
pub use collect::collect_commits;
pub use compose::{compose_pull_request, pull_request_branch_name, short_hash};
pub use engine::{
    CherryPickOptions, cherry_pick_as_pull_request, cherry_pick_as_pull_request_until,
    cherry_pick_commits, cherry_pick_commits_until, execute_cherry_pick,
    execute_cherry_pick_until,
};
pub use progress::{NoopProgress, ProgressCallback};
pub use publish::{open_pull_request, publish_direct};
pub use replay::{ReplayState, build_replay_commit, replay_commits, replay_message, replay_step};
pub use retry::with_retry;
pub use simulate::{sibling_commit, simulate_merge};
pub use temp_branch::{create_temp_branch, temp_branch_name};
