//! Core types for cherry-pick-bot

use serde::{Deserialize, Serialize};

/// Name, email and (optionally) timestamp of a commit author or committer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// ISO 8601 timestamp, carried over verbatim when replaying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A commit as returned by the Git Data API
///
/// Commits are immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    /// Commit SHA
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Original author
    pub author: Identity,
    /// Original committer
    pub committer: Identity,
    /// Parent commit SHAs, first parent first
    pub parents: Vec<String>,
    /// Root tree SHA
    pub tree_sha: String,
}

impl Commit {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// First parent, if any (root commits have none)
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Payload for creating a new commit object
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewCommit {
    /// Commit message
    pub message: String,
    /// Tree SHA
    pub tree: String,
    /// Parent SHAs
    pub parents: Vec<String>,
    /// Author identity
    pub author: Identity,
    /// Committer identity
    pub committer: Identity,
}

/// A branch reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitRef {
    /// Branch name, without `refs/heads/`
    pub name: String,
    /// Commit SHA the ref points at
    pub sha: String,
}

/// Scratch branch owned by a single in-flight request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempBranch {
    /// Branch name
    pub name: String,
    /// SHA the branch was created (or found) at
    pub base_sha: String,
    /// Whether an existing ref at the expected SHA was reused
    pub reused: bool,
}

/// Answer from the host's merge endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merged cleanly; the base branch now points at `sha`
    Clean {
        /// SHA of the host-synthesized merge commit
        sha: String,
        /// Tree of the merge commit
        tree_sha: String,
    },
    /// The head does not apply cleanly onto the base
    Conflict,
    /// The base already contains the head
    NothingToMerge,
}

/// A clean merge, as seen by the replayer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// SHA of the host's merge commit (discarded after replay)
    pub merge_sha: String,
    /// Tree the replayed commit will use
    pub tree_sha: String,
}

/// A commit written by the replayer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayedCommit {
    /// SHA of the new commit
    pub sha: String,
    /// The source commit it replays
    pub source_sha: String,
    /// Its single parent
    pub parent: String,
    /// Its tree
    pub tree_sha: String,
    /// Its message
    pub message: String,
}

/// How the replayed commits are published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishMode {
    /// Update the target branch directly
    Direct,
    /// Open a pull request against the target branch
    PullRequest,
}

impl std::fmt::Display for PublishMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::PullRequest => write!(f, "pull-request"),
        }
    }
}

/// One cherry-pick invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CherryPickRequest {
    /// Source commit SHAs, in the order they are applied
    pub commits: Vec<String>,
    /// Branch receiving the commits
    pub target_branch: String,
    /// Publication mode
    pub mode: PublishMode,
    /// Pull request title to use instead of the first commit's summary
    pub title_override: Option<String>,
}

/// Pull request contents, computed before anything is opened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestDraft {
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
}

/// A pull request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR title
    pub title: String,
}

/// Repository coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// Result of a direct cherry-pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectOutcome {
    /// New tip of the target branch
    pub final_sha: String,
    /// Replayed commits, in order
    pub commits: Vec<ReplayedCommit>,
}

/// Result of a cherry-pick published as a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestOutcome {
    /// The opened (or already open) pull request
    pub pull_request: PullRequest,
    /// Head branch of the pull request
    pub head_ref: String,
    /// Replayed commits, in order (empty when `reused`)
    pub commits: Vec<ReplayedCommit>,
    /// Whether an identical earlier request already opened this PR
    pub reused: bool,
}

/// Result of [`execute_cherry_pick`](crate::cherry_pick::execute_cherry_pick)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CherryPickOutcome {
    /// The target branch was updated
    Direct(DirectOutcome),
    /// A pull request was opened
    PullRequest(PullRequestOutcome),
}

/// Lifecycle of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Request accepted
    Init,
    /// Scratch branch exists at the target tip
    TempBranchCreated,
    /// Replaying commit `n` (0-based)
    Replaying(usize),
    /// Every commit replayed cleanly
    Replayed,
    /// Target branch updated
    DirectPublished,
    /// Pull request opened
    PrOpened,
    /// Scratch state released
    CleanedUp,
    /// A step failed
    Failed,
    /// Cleanup ran after a failure
    CleanupAttempted,
    /// Error handed back to the caller
    ErrorReported,
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::TempBranchCreated => write!(f, "temp branch created"),
            Self::Replaying(n) => write!(f, "replaying #{}", n + 1),
            Self::Replayed => write!(f, "replayed"),
            Self::DirectPublished => write!(f, "published"),
            Self::PrOpened => write!(f, "pull request opened"),
            Self::CleanedUp => write!(f, "cleaned up"),
            Self::Failed => write!(f, "failed"),
            Self::CleanupAttempted => write!(f, "cleanup attempted"),
            Self::ErrorReported => write!(f, "error reported"),
        }
    }
}
