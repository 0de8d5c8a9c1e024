//! Request orchestration
//!
//! Drives one request through collect, temp branch, replay and publish, and
//! makes sure the scratch branch is released on every exit path: success,
//! failure and cancellation alike.

use crate::cherry_pick::cleanup::cleanup_temp_branch;
use crate::cherry_pick::collect::collect_commits;
use crate::cherry_pick::compose::compose_pull_request;
use crate::cherry_pick::progress::ProgressCallback;
use crate::cherry_pick::publish::{open_pull_request, publish_direct};
use crate::cherry_pick::replay::{ReplayState, replay_commits};
use crate::cherry_pick::retry::with_retry;
use crate::cherry_pick::temp_branch::{create_temp_branch, temp_branch_name};
use crate::config::{EngineConfig, StaleRefPolicy};
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CherryPickOutcome, CherryPickRequest, Commit, DirectOutcome, GitRef, PublishMode,
    PullRequestDraft, PullRequestOutcome, RequestState, TempBranch,
};
use std::future::{self, Future};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Knobs for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CherryPickOptions {
    /// Handling of a scratch branch left at an unexpected commit
    pub stale_ref_policy: StaleRefPolicy,
    /// Open a pull request when a direct target requires reviews
    pub fallback_to_pull_request: bool,
}

impl Default for CherryPickOptions {
    fn default() -> Self {
        Self {
            stale_ref_policy: StaleRefPolicy::Recreate,
            fallback_to_pull_request: true,
        }
    }
}

impl From<&EngineConfig> for CherryPickOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            stale_ref_policy: config.stale_ref_policy,
            fallback_to_pull_request: config.fallback_to_pull_request,
        }
    }
}

/// Cherry-pick `shas` onto `target` and move `target` to the result
pub async fn cherry_pick_commits(
    platform: &dyn PlatformService,
    shas: &[String],
    target: &str,
    options: CherryPickOptions,
    progress: &dyn ProgressCallback,
) -> Result<DirectOutcome> {
    cherry_pick_commits_until(platform, shas, target, options, progress, future::pending()).await
}

/// [`cherry_pick_commits`], abandoned with [`Error::Cancelled`] once `cancel` resolves
pub async fn cherry_pick_commits_until(
    platform: &dyn PlatformService,
    shas: &[String],
    target: &str,
    options: CherryPickOptions,
    progress: &dyn ProgressCallback,
    cancel: impl Future<Output = ()>,
) -> Result<DirectOutcome> {
    let run = Run::start(platform, options, progress, shas, target, PublishMode::Direct).await;
    let result = race(run.direct(shas, target), cancel).await;
    run.finish(result).await
}

/// Cherry-pick `shas` onto a new branch and open a pull request against `target`
///
/// An identical earlier request that already has an open pull request is
/// answered with that pull request (`reused = true`) without touching any ref.
pub async fn cherry_pick_as_pull_request(
    platform: &dyn PlatformService,
    shas: &[String],
    target: &str,
    title_override: Option<&str>,
    options: CherryPickOptions,
    progress: &dyn ProgressCallback,
) -> Result<PullRequestOutcome> {
    cherry_pick_as_pull_request_until(
        platform,
        shas,
        target,
        title_override,
        options,
        progress,
        future::pending(),
    )
    .await
}

/// [`cherry_pick_as_pull_request`], abandoned with [`Error::Cancelled`] once `cancel` resolves
pub async fn cherry_pick_as_pull_request_until(
    platform: &dyn PlatformService,
    shas: &[String],
    target: &str,
    title_override: Option<&str>,
    options: CherryPickOptions,
    progress: &dyn ProgressCallback,
    cancel: impl Future<Output = ()>,
) -> Result<PullRequestOutcome> {
    let run = Run::start(platform, options, progress, shas, target, PublishMode::PullRequest).await;
    let result = race(run.pull_request(shas, target, title_override), cancel).await;
    run.finish(result).await
}

/// Run a [`CherryPickRequest`] in its requested mode
///
/// Direct requests against a branch that requires reviews are published as a
/// pull request instead when `options.fallback_to_pull_request` is set, and
/// rejected with [`Error::PermissionDenied`] otherwise. The same fallback
/// applies when the host refuses the final push, which is how protection
/// shows up for tokens that may not read protection settings.
pub async fn execute_cherry_pick(
    platform: &dyn PlatformService,
    request: &CherryPickRequest,
    options: CherryPickOptions,
    progress: &dyn ProgressCallback,
) -> Result<CherryPickOutcome> {
    execute_cherry_pick_until(platform, request, options, progress, future::pending()).await
}

/// [`execute_cherry_pick`], abandoned with [`Error::Cancelled`] once `cancel` resolves
pub async fn execute_cherry_pick_until(
    platform: &dyn PlatformService,
    request: &CherryPickRequest,
    options: CherryPickOptions,
    progress: &dyn ProgressCallback,
    cancel: impl Future<Output = ()>,
) -> Result<CherryPickOutcome> {
    let run = Run::start(
        platform,
        options,
        progress,
        &request.commits,
        &request.target_branch,
        request.mode,
    )
    .await;

    let work = async {
        match run.resolve_mode(request).await? {
            PublishMode::Direct => run.direct_or_fallback(request).await,
            PublishMode::PullRequest => run
                .pull_request(
                    &request.commits,
                    &request.target_branch,
                    request.title_override.as_deref(),
                )
                .await
                .map(CherryPickOutcome::PullRequest),
        }
    };
    let result = race(work, cancel).await;
    run.finish(result).await
}

async fn race<T>(
    work: impl Future<Output = Result<T>>,
    cancel: impl Future<Output = ()>,
) -> Result<T> {
    tokio::select! {
        biased;
        result = work => result,
        () = cancel => {
            warn!("cherry-pick cancelled");
            Err(Error::Cancelled)
        }
    }
}

/// State shared by the steps of one request
struct Run<'a> {
    platform: &'a dyn PlatformService,
    options: CherryPickOptions,
    progress: &'a dyn ProgressCallback,
    /// Scratch branch this request created and still owns
    temp: Mutex<Option<String>>,
}

impl<'a> Run<'a> {
    async fn start(
        platform: &'a dyn PlatformService,
        options: CherryPickOptions,
        progress: &'a dyn ProgressCallback,
        shas: &[String],
        target: &str,
        mode: PublishMode,
    ) -> Self {
        info!(commits = shas.len(), target, %mode, "starting cherry-pick");
        progress.on_state(RequestState::Init).await;
        Self {
            platform,
            options,
            progress,
            temp: Mutex::new(None),
        }
    }

    /// Release whatever scratch state is still owned and report the outcome
    async fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                if let Some(name) = self.take_temp() {
                    cleanup_temp_branch(self.platform, &name).await;
                }
                self.progress.on_state(RequestState::CleanedUp).await;
                Ok(value)
            }
            Err(e) => {
                self.progress.on_state(RequestState::Failed).await;
                if let Some(name) = self.take_temp() {
                    cleanup_temp_branch(self.platform, &name).await;
                }
                self.progress.on_state(RequestState::CleanupAttempted).await;
                warn!(error = %e, "cherry-pick failed");
                self.progress.on_state(RequestState::ErrorReported).await;
                Err(e)
            }
        }
    }

    fn take_temp(&self) -> Option<String> {
        self.temp
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Create (or reconcile) the scratch branch and take ownership of it
    ///
    /// A pull request head that already existed may belong to an identical
    /// request running concurrently, so it is never claimed.
    async fn create_temp(&self, name: &str, sha: &str, mode: PublishMode) -> Result<TempBranch> {
        let temp =
            create_temp_branch(self.platform, name, sha, self.options.stale_ref_policy).await?;
        if temp.reused && mode == PublishMode::PullRequest {
            debug!(branch = %temp.name, "reusing existing pull request head");
        } else {
            *self.temp.lock().unwrap_or_else(PoisonError::into_inner) = Some(temp.name.clone());
        }
        self.progress.on_state(RequestState::TempBranchCreated).await;
        Ok(temp)
    }

    async fn target_tip(&self, target: &str) -> Result<GitRef> {
        with_retry("get_ref", || self.platform.get_ref(target))
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::NotFound(format!("branch {target}")),
                other => other,
            })
    }

    /// Create the scratch branch at `target`'s tip and replay onto it
    async fn replay_onto(
        &self,
        target: &str,
        temp_name: &str,
        mode: PublishMode,
        commits: &[Commit],
    ) -> Result<(GitRef, ReplayState)> {
        let base = self.target_tip(target).await?;
        let temp = self.create_temp(temp_name, &base.sha, mode).await?;
        let base_commit = with_retry("get_commit", || self.platform.get_commit(&base.sha)).await?;

        let state = replay_commits(
            self.platform,
            &temp.name,
            commits,
            ReplayState::new(base.sha.clone(), base_commit.tree_sha),
            self.progress,
        )
        .await?;
        self.progress.on_state(RequestState::Replayed).await;
        Ok((base, state))
    }

    async fn direct(&self, shas: &[String], target: &str) -> Result<DirectOutcome> {
        let commits = collect_commits(self.platform, shas).await?;
        let (base, state) = self
            .replay_onto(target, &temp_branch_name(target), PublishMode::Direct, &commits)
            .await?;

        let final_sha = publish_direct(self.platform, target, &base.sha, &state.tip_sha).await?;
        self.published_direct(target, final_sha, state).await
    }

    async fn published_direct(
        &self,
        target: &str,
        final_sha: String,
        state: ReplayState,
    ) -> Result<DirectOutcome> {
        self.progress.on_state(RequestState::DirectPublished).await;
        self.progress
            .on_message(&format!("Updated {target} to {final_sha}"))
            .await;

        Ok(DirectOutcome {
            final_sha,
            commits: state.replayed,
        })
    }

    /// Direct publish that turns a refused push into a pull request
    ///
    /// The replayed commits are kept: the pull request head is created at the
    /// replayed tip instead of replaying again.
    async fn direct_or_fallback(&self, request: &CherryPickRequest) -> Result<CherryPickOutcome> {
        let target = request.target_branch.as_str();
        let commits = collect_commits(self.platform, &request.commits).await?;
        let (base, state) = self
            .replay_onto(target, &temp_branch_name(target), PublishMode::Direct, &commits)
            .await?;

        match publish_direct(self.platform, target, &base.sha, &state.tip_sha).await {
            Ok(final_sha) => self
                .published_direct(target, final_sha, state)
                .await
                .map(CherryPickOutcome::Direct),
            Err(Error::PermissionDenied(reason)) if self.options.fallback_to_pull_request => {
                warn!(branch = target, %reason, "push refused, opening a pull request instead");
                self.progress
                    .on_message(&format!(
                        "{target} refused the update, opening a pull request instead"
                    ))
                    .await;
                if let Some(name) = self.take_temp() {
                    cleanup_temp_branch(self.platform, &name).await;
                }

                let draft =
                    compose_pull_request(&commits, target, request.title_override.as_deref());
                if let Some(outcome) = self.existing_pull_request(&draft).await? {
                    return Ok(CherryPickOutcome::PullRequest(outcome));
                }
                self.create_temp(&draft.head, &state.tip_sha, PublishMode::PullRequest)
                    .await?;
                self.opened_pull_request(draft, state)
                    .await
                    .map(CherryPickOutcome::PullRequest)
            }
            Err(e) => Err(e),
        }
    }

    /// An open pull request for `draft.head`, reported as reused
    async fn existing_pull_request(
        &self,
        draft: &PullRequestDraft,
    ) -> Result<Option<PullRequestOutcome>> {
        let existing =
            with_retry("find_existing_pr", || self.platform.find_existing_pr(&draft.head)).await?;
        let Some(pull_request) = existing else {
            return Ok(None);
        };

        info!(number = pull_request.number, head = %draft.head, "pull request already open");
        self.progress.on_state(RequestState::PrOpened).await;
        Ok(Some(PullRequestOutcome {
            pull_request,
            head_ref: draft.head.clone(),
            commits: Vec::new(),
            reused: true,
        }))
    }

    async fn opened_pull_request(
        &self,
        draft: PullRequestDraft,
        state: ReplayState,
    ) -> Result<PullRequestOutcome> {
        let pull_request = open_pull_request(self.platform, &draft).await?;
        // The scratch branch is now the PR head and must outlive the request
        self.take_temp();
        self.progress.on_state(RequestState::PrOpened).await;
        self.progress
            .on_message(&format!(
                "Opened #{} {}",
                pull_request.number, pull_request.html_url
            ))
            .await;

        Ok(PullRequestOutcome {
            pull_request,
            head_ref: draft.head,
            commits: state.replayed,
            reused: false,
        })
    }

    async fn pull_request(
        &self,
        shas: &[String],
        target: &str,
        title_override: Option<&str>,
    ) -> Result<PullRequestOutcome> {
        let commits = collect_commits(self.platform, shas).await?;
        let draft = compose_pull_request(&commits, target, title_override);

        if let Some(outcome) = self.existing_pull_request(&draft).await? {
            return Ok(outcome);
        }

        let (_, state) = self
            .replay_onto(target, &draft.head, PublishMode::PullRequest, &commits)
            .await?;
        self.opened_pull_request(draft, state).await
    }

    async fn resolve_mode(&self, request: &CherryPickRequest) -> Result<PublishMode> {
        if request.mode == PublishMode::PullRequest {
            return Ok(PublishMode::PullRequest);
        }

        let target = request.target_branch.as_str();
        let requires_reviews = match with_retry("branch_requires_reviews", || {
            self.platform.branch_requires_reviews(target)
        })
        .await
        {
            Ok(required) => required,
            // Reading protection needs admin rights; a refused push still falls back
            Err(Error::PermissionDenied(reason)) => {
                debug!(branch = target, %reason, "cannot read branch protection");
                false
            }
            Err(e) => return Err(e),
        };
        if !requires_reviews {
            return Ok(PublishMode::Direct);
        }

        if self.options.fallback_to_pull_request {
            warn!(branch = target, "target requires reviews, opening a pull request instead");
            self.progress
                .on_message(&format!(
                    "{target} requires reviews, opening a pull request instead"
                ))
                .await;
            Ok(PublishMode::PullRequest)
        } else {
            Err(Error::PermissionDenied(format!(
                "branch {target} requires pull request reviews"
            )))
        }
    }
}
