//! Mock platform service for testing
//!
//! An in-memory Git host: refs, commits and pull requests live in maps and
//! the merge endpoint is scripted per commit.

#![allow(dead_code)]

use async_trait::async_trait;
use cherry_pick_bot::error::{Error, Result};
use cherry_pick_bot::platform::PlatformService;
use cherry_pick_bot::types::{
    Commit, GitRef, Identity, MergeOutcome, NewCommit, PlatformConfig, PullRequest,
    PullRequestDraft,
};
use md5::{Digest, Md5};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// One call made against the host, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    GetRef(String),
    CreateRef { branch: String, sha: String },
    UpdateRef { branch: String, sha: String, force: bool },
    DeleteRef(String),
    GetCommit(String),
    CreateCommit(NewCommit),
    Merge { base: String, head: String },
    CreatePullRequest(PullRequestDraft),
    FindExistingPr(String),
    CreateComment { issue_number: u64, body: String },
    BranchRequiresReviews(String),
}

impl HostCall {
    /// Operation name, matching the names used for error injection
    pub const fn op(&self) -> &'static str {
        match self {
            Self::GetRef(_) => "get_ref",
            Self::CreateRef { .. } => "create_ref",
            Self::UpdateRef { .. } => "update_ref",
            Self::DeleteRef(_) => "delete_ref",
            Self::GetCommit(_) => "get_commit",
            Self::CreateCommit(_) => "create_commit",
            Self::Merge { .. } => "merge",
            Self::CreatePullRequest(_) => "create_pull_request",
            Self::FindExistingPr(_) => "find_existing_pr",
            Self::CreateComment { .. } => "create_comment",
            Self::BranchRequiresReviews(_) => "branch_requires_reviews",
        }
    }
}

#[derive(Default)]
struct HostState {
    refs: HashMap<String, String>,
    commits: HashMap<String, Commit>,
    pull_requests: Vec<PullRequest>,
    protected: HashSet<String>,
    push_rejected: HashSet<String>,
    conflicts: HashSet<String>,
    nothing_to_merge: HashSet<String>,
    merge_trees: HashMap<String, String>,
    move_on_merge: Option<(String, String)>,
}

/// In-memory host implementing `PlatformService`
///
/// Features:
/// - Content-addressed commit SHAs (identical commits get identical SHAs)
/// - Merge trees derived from the base tree, or scripted per commit
/// - Scripted conflicts and empty merges
/// - Call tracking for verification
/// - Queued error injection, before or after the call takes effect
/// - A merge that never returns, for cancellation tests
pub struct MockPlatformService {
    config: PlatformConfig,
    state: Mutex<HostState>,
    calls: Mutex<Vec<HostCall>>,
    errors_before: Mutex<HashMap<&'static str, VecDeque<Error>>>,
    errors_after: Mutex<HashMap<&'static str, VecDeque<Error>>>,
    hang_merge: AtomicBool,
    merge_started: Notify,
}

/// Identity used for every fixture commit
pub fn identity() -> Identity {
    Identity {
        name: "Test Author".to_string(),
        email: "author@example.com".to_string(),
        date: Some("2024-03-01T10:00:00Z".to_string()),
    }
}

fn content_sha(commit: &NewCommit) -> String {
    let digest = Md5::digest(
        format!(
            "{}\n{}\n{:?}\n{:?}\n{:?}",
            commit.tree, commit.message, commit.parents, commit.author, commit.committer
        )
        .as_bytes(),
    );
    let mut hex = format!("{digest:x}");
    hex.truncate(12);
    hex
}

impl MockPlatformService {
    /// Create an empty host for the given repository
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HostState::default()),
            calls: Mutex::new(Vec::new()),
            errors_before: Mutex::new(HashMap::new()),
            errors_after: Mutex::new(HashMap::new()),
            hang_merge: AtomicBool::new(false),
            merge_started: Notify::new(),
        }
    }

    // === Repository setup ===

    /// Add a commit with an explicit tree
    pub fn add_commit_with_tree(&self, sha: &str, message: &str, parents: &[&str], tree: &str) {
        let commit = Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            author: identity(),
            committer: identity(),
            parents: parents.iter().map(ToString::to_string).collect(),
            tree_sha: tree.to_string(),
        };
        self.state
            .lock()
            .unwrap()
            .commits
            .insert(sha.to_string(), commit);
    }

    /// Add a commit whose tree is `tree-<sha>`
    pub fn add_commit(&self, sha: &str, message: &str, parents: &[&str]) {
        self.add_commit_with_tree(sha, message, parents, &format!("tree-{sha}"));
    }

    /// Point a branch at a commit
    pub fn set_branch(&self, branch: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .refs
            .insert(branch.to_string(), sha.to_string());
    }

    /// Require reviews on a branch
    pub fn protect_branch(&self, branch: &str) {
        self.state
            .lock()
            .unwrap()
            .protected
            .insert(branch.to_string());
    }

    /// Refuse every update of `branch`, as GitHub does for protected branches
    pub fn reject_pushes(&self, branch: &str) {
        self.state
            .lock()
            .unwrap()
            .push_rejected
            .insert(branch.to_string());
    }

    /// Make merging `sha` conflict
    pub fn set_conflict(&self, sha: &str) {
        self.state.lock().unwrap().conflicts.insert(sha.to_string());
    }

    /// Make merging `sha` report nothing to merge
    pub fn set_nothing_to_merge(&self, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .nothing_to_merge
            .insert(sha.to_string());
    }

    /// Use `tree` as the result of merging `sha`
    pub fn set_merge_tree(&self, sha: &str, tree: &str) {
        self.state
            .lock()
            .unwrap()
            .merge_trees
            .insert(sha.to_string(), tree.to_string());
    }

    /// Move `branch` to `sha` as a side effect of the next merge
    pub fn move_branch_on_merge(&self, branch: &str, sha: &str) {
        self.state.lock().unwrap().move_on_merge = Some((branch.to_string(), sha.to_string()));
    }

    /// Add an open pull request
    pub fn add_pull_request(&self, number: u64, head: &str, base: &str, title: &str) {
        let pr = self.make_pr(number, head, base, title);
        self.state.lock().unwrap().pull_requests.push(pr);
    }

    // === Error injection methods ===

    /// Fail the next call to `op` without performing it
    pub fn fail_next(&self, op: &'static str, error: Error) {
        self.errors_before
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Perform the next call to `op`, then report `error` anyway
    pub fn fail_after_next(&self, op: &'static str, error: Error) {
        self.errors_after
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Make `merge` hang forever
    pub fn hang_on_merge(&self) {
        self.hang_merge.store(true, Ordering::SeqCst);
    }

    /// Resolves once a hanging merge has been entered
    pub async fn merge_started(&self) {
        self.merge_started.notified().await;
    }

    // === Inspection ===

    /// Where a branch points, if it exists
    pub fn ref_sha(&self, branch: &str) -> Option<String> {
        self.state.lock().unwrap().refs.get(branch).cloned()
    }

    /// All branch names, sorted
    pub fn branches(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().unwrap().refs.keys().cloned().collect();
        names.sort();
        names
    }

    /// A stored commit
    pub fn commit(&self, sha: &str) -> Option<Commit> {
        self.state.lock().unwrap().commits.get(sha).cloned()
    }

    /// Open pull requests
    pub fn pull_requests(&self) -> Vec<PullRequest> {
        self.state.lock().unwrap().pull_requests.clone()
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls to `op`
    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.op() == op).count()
    }

    /// Comments posted, as `(issue, body)`
    pub fn comments(&self) -> Vec<(u64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::CreateComment { issue_number, body } => Some((issue_number, body)),
                _ => None,
            })
            .collect()
    }

    /// Assert that a branch does not exist
    pub fn assert_branch_absent(&self, branch: &str) {
        assert!(
            self.ref_sha(branch).is_none(),
            "expected branch {branch} to be deleted, found it at {:?}",
            self.ref_sha(branch)
        );
    }

    /// Assert that no ref was ever created
    pub fn assert_no_ref_created(&self) {
        assert_eq!(
            self.call_count("create_ref"),
            0,
            "expected no create_ref calls, got: {:?}",
            self.calls()
        );
    }

    // === Internals ===

    fn record(&self, call: HostCall) -> Result<()> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);
        match self
            .errors_before
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front)
        {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn after(&self, op: &'static str) -> Result<()> {
        match self
            .errors_after
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front)
        {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn make_pr(&self, number: u64, head: &str, base: &str, title: &str) -> PullRequest {
        PullRequest {
            number,
            html_url: format!(
                "https://github.com/{}/{}/pull/{number}",
                self.config.owner, self.config.repo
            ),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: title.to_string(),
        }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_ref(&self, branch: &str) -> Result<GitRef> {
        self.record(HostCall::GetRef(branch.to_string()))?;
        let sha = self
            .ref_sha(branch)
            .ok_or_else(|| Error::NotFound(format!("branch {branch}")))?;
        Ok(GitRef {
            name: branch.to_string(),
            sha,
        })
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<GitRef> {
        self.record(HostCall::CreateRef {
            branch: branch.to_string(),
            sha: sha.to_string(),
        })?;
        {
            let mut state = self.state.lock().unwrap();
            if state.refs.contains_key(branch) {
                return Err(Error::AlreadyExists {
                    name: branch.to_string(),
                    existing_sha: None,
                });
            }
            state.refs.insert(branch.to_string(), sha.to_string());
        }
        self.after("create_ref")?;
        Ok(GitRef {
            name: branch.to_string(),
            sha: sha.to_string(),
        })
    }

    async fn update_ref(&self, branch: &str, sha: &str, force: bool) -> Result<GitRef> {
        self.record(HostCall::UpdateRef {
            branch: branch.to_string(),
            sha: sha.to_string(),
            force,
        })?;
        {
            let mut state = self.state.lock().unwrap();
            if state.push_rejected.contains(branch) {
                return Err(Error::PermissionDenied(format!(
                    "branch {branch} is protected"
                )));
            }
            let Some(current) = state.refs.get_mut(branch) else {
                return Err(Error::NotFound(format!("branch {branch}")));
            };
            *current = sha.to_string();
        }
        self.after("update_ref")?;
        Ok(GitRef {
            name: branch.to_string(),
            sha: sha.to_string(),
        })
    }

    async fn delete_ref(&self, branch: &str) -> Result<()> {
        self.record(HostCall::DeleteRef(branch.to_string()))?;
        if self.state.lock().unwrap().refs.remove(branch).is_none() {
            return Err(Error::NotFound(format!("branch {branch}")));
        }
        self.after("delete_ref")
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit> {
        self.record(HostCall::GetCommit(sha.to_string()))?;
        self.commit(sha)
            .ok_or_else(|| Error::NotFound(format!("commit {sha}")))
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String> {
        self.record(HostCall::CreateCommit(commit.clone()))?;
        let sha = content_sha(commit);
        self.state.lock().unwrap().commits.insert(
            sha.clone(),
            Commit {
                sha: sha.clone(),
                message: commit.message.clone(),
                author: commit.author.clone(),
                committer: commit.committer.clone(),
                parents: commit.parents.clone(),
                tree_sha: commit.tree.clone(),
            },
        );
        self.after("create_commit")?;
        Ok(sha)
    }

    async fn merge(&self, base: &str, head: &str, message: &str) -> Result<MergeOutcome> {
        self.record(HostCall::Merge {
            base: base.to_string(),
            head: head.to_string(),
        })?;

        if self.hang_merge.load(Ordering::SeqCst) {
            self.merge_started.notify_one();
            std::future::pending::<()>().await;
        }

        let outcome = {
            let mut state = self.state.lock().unwrap();
            if let Some((branch, sha)) = state.move_on_merge.take() {
                state.refs.insert(branch, sha);
            }

            let tip_sha = state
                .refs
                .get(base)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("branch {base}")))?;
            let tip = state
                .commits
                .get(&tip_sha)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("commit {tip_sha}")))?;

            if state.conflicts.contains(head) {
                MergeOutcome::Conflict
            } else if state.nothing_to_merge.contains(head)
                || tip.parents.iter().any(|p| p == head)
            {
                MergeOutcome::NothingToMerge
            } else {
                let tree_sha = state
                    .merge_trees
                    .get(head)
                    .cloned()
                    .unwrap_or_else(|| format!("{}+{head}", tip.tree_sha));
                let merge = NewCommit {
                    message: message.to_string(),
                    tree: tree_sha.clone(),
                    parents: vec![tip_sha, head.to_string()],
                    author: identity(),
                    committer: identity(),
                };
                let sha = content_sha(&merge);
                state.commits.insert(
                    sha.clone(),
                    Commit {
                        sha: sha.clone(),
                        message: merge.message,
                        author: merge.author,
                        committer: merge.committer,
                        parents: merge.parents,
                        tree_sha: tree_sha.clone(),
                    },
                );
                state.refs.insert(base.to_string(), sha.clone());
                MergeOutcome::Clean { sha, tree_sha }
            }
        };

        self.after("merge")?;
        Ok(outcome)
    }

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequest> {
        self.record(HostCall::CreatePullRequest(draft.clone()))?;
        let pr = {
            let mut state = self.state.lock().unwrap();
            if state.pull_requests.iter().any(|pr| pr.head_ref == draft.head) {
                return Err(Error::AlreadyExists {
                    name: draft.head.clone(),
                    existing_sha: None,
                });
            }
            if !state.refs.contains_key(&draft.head) {
                return Err(Error::NotFound(format!("branch {}", draft.head)));
            }
            let number = state.pull_requests.iter().map(|p| p.number).max().unwrap_or(0) + 1;
            let pr = self.make_pr(number, &draft.head, &draft.base, &draft.title);
            state.pull_requests.push(pr.clone());
            pr
        };
        self.after("create_pull_request")?;
        Ok(pr)
    }

    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        self.record(HostCall::FindExistingPr(head_branch.to_string()))?;
        Ok(self
            .pull_requests()
            .into_iter()
            .find(|pr| pr.head_ref == head_branch))
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        self.record(HostCall::CreateComment {
            issue_number,
            body: body.to_string(),
        })
    }

    async fn branch_requires_reviews(&self, branch: &str) -> Result<bool> {
        self.record(HostCall::BranchRequiresReviews(branch.to_string()))?;
        Ok(self.state.lock().unwrap().protected.contains(branch))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
