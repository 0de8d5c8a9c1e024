//! Pick command - cherry-pick commits onto a branch

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::{eprintln, println};
use cherry_pick_bot::cherry_pick::{
    collect_commits, compose_pull_request, execute_cherry_pick_until, temp_branch_name,
};
use cherry_pick_bot::config::EngineConfig;
use cherry_pick_bot::error::{Error, Result};
use cherry_pick_bot::types::{
    CherryPickOutcome, CherryPickRequest, Commit, PublishMode, PullRequestDraft,
};
use dialoguer::Confirm;
use std::future;

/// Options for the pick command
#[derive(Debug, Clone, Default)]
pub struct PickOptions {
    /// Update the branch directly instead of opening a pull request
    pub direct: bool,
    /// Pull request title override
    pub title: Option<String>,
    /// Show the plan without changing anything
    pub dry_run: bool,
    /// Show the plan and prompt before executing
    pub confirm: bool,
}

/// Run the pick command
pub async fn run_pick(
    config: &EngineConfig,
    repo: &str,
    branch: &str,
    commits: &[String],
    token: Option<&str>,
    options: PickOptions,
) -> Result<()> {
    let ctx = CommandContext::new(config, repo, token).await?;

    let request = CherryPickRequest {
        commits: commits.to_vec(),
        target_branch: branch.to_string(),
        mode: if options.direct {
            PublishMode::Direct
        } else {
            PublishMode::PullRequest
        },
        title_override: options.title.clone(),
    };

    if options.dry_run || options.confirm {
        // Read-only: resolve the commits so the plan shows real summaries
        let resolved = collect_commits(ctx.platform.as_ref(), &request.commits).await?;
        let draft = compose_pull_request(&resolved, branch, request.title_override.as_deref());
        report_plan(&ctx, &request, &resolved, &draft);

        if options.dry_run {
            println!("{}", "Dry run, nothing was changed.".muted());
            return Ok(());
        }

        if !Confirm::new()
            .with_prompt("Proceed with cherry-pick?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
        println!();
    }

    let progress = CliProgress::spinner(&format!(
        "Cherry-picking {} commit(s) onto {}...",
        request.commits.len(),
        branch.accent()
    ));

    let cancel = async {
        // Without a signal handler, never cancel
        if tokio::signal::ctrl_c().await.is_err() {
            future::pending::<()>().await;
        }
    };

    match execute_cherry_pick_until(ctx.platform.as_ref(), &request, ctx.options, &progress, cancel)
        .await
    {
        Ok(CherryPickOutcome::Direct(outcome)) => {
            progress.finish(&format!(
                "Updated {} to {}",
                branch.accent(),
                outcome.final_sha.emphasis()
            ));
            for commit in &outcome.commits {
                println!(
                    "  {} {} {}",
                    check(),
                    commit.source_sha.muted(),
                    commit.sha.accent()
                );
            }
        }
        Ok(CherryPickOutcome::PullRequest(outcome)) => {
            let verb = if outcome.reused { "Found open" } else { "Opened" };
            progress.finish(&format!(
                "{verb} PR #{} {}",
                outcome.pull_request.number,
                outcome.pull_request.html_url.accent()
            ));
            println!("  {} {}", "head:".muted(), outcome.head_ref);
        }
        Err(e) => {
            progress.fail(&e.summary());
            if matches!(e, Error::Cancelled) {
                eprintln!("{}", "Cancelled; temporary branches were cleaned up.".warn());
            }
            return Err(e);
        }
    }

    Ok(())
}

fn report_plan(
    ctx: &CommandContext,
    request: &CherryPickRequest,
    commits: &[Commit],
    draft: &PullRequestDraft,
) {
    println!(
        "{} {} commit(s) onto {} in {}",
        "Cherry-pick".emphasis(),
        commits.len(),
        request.target_branch.accent(),
        ctx.slug()
    );
    for commit in commits {
        println!("  {} {}", commit.sha.muted(), commit.summary());
    }

    match request.mode {
        PublishMode::Direct => {
            println!(
                "{} update {} directly via {}",
                "Mode:".muted(),
                request.target_branch,
                temp_branch_name(&request.target_branch)
            );
            if ctx.options.fallback_to_pull_request {
                println!(
                    "{}",
                    "  (opens a pull request instead if the branch requires reviews)".muted()
                );
            }
        }
        PublishMode::PullRequest => {
            println!("{} pull request from {}", "Mode:".muted(), draft.head.accent());
            println!("{} {}", "Title:".muted(), draft.title);
        }
    }
    println!();
}
