//! Hosting platform services
//!
//! Provides the Git Data and pull request operations the cherry-pick engine
//! needs, behind a trait so the engine never talks HTTP directly.

mod detection;
mod factory;
mod github;

pub use detection::parse_repo_slug;
pub use factory::create_platform_service;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    Commit, GitRef, MergeOutcome, NewCommit, PlatformConfig, PullRequest, PullRequestDraft,
};
use async_trait::async_trait;

/// Platform service trait for Git Data and PR operations
///
/// Branch names are passed without the `refs/heads/` prefix.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Resolve a branch to the commit it points at
    async fn get_ref(&self, branch: &str) -> Result<GitRef>;

    /// Create a new branch at `sha`
    ///
    /// Fails with [`Error::AlreadyExists`](crate::Error::AlreadyExists) if the
    /// branch exists, whatever it points at.
    async fn create_ref(&self, branch: &str, sha: &str) -> Result<GitRef>;

    /// Move a branch to `sha`
    async fn update_ref(&self, branch: &str, sha: &str, force: bool) -> Result<GitRef>;

    /// Delete a branch
    async fn delete_ref(&self, branch: &str) -> Result<()>;

    /// Fetch a commit object
    async fn get_commit(&self, sha: &str) -> Result<Commit>;

    /// Write a new commit object and return its SHA
    async fn create_commit(&self, commit: &NewCommit) -> Result<String>;

    /// Merge `head` (a SHA) into the branch `base`
    ///
    /// On a clean merge the host advances `base` to its merge commit.
    async fn merge(&self, base: &str, head: &str, message: &str) -> Result<MergeOutcome>;

    /// Open a pull request
    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequest>;

    /// Find an existing open PR for a head branch
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>>;

    /// Comment on an issue or pull request
    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()>;

    /// Whether the branch is protected with required pull request reviews
    async fn branch_requires_reviews(&self, branch: &str) -> Result<bool>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
