//! Pull request comment commands
//!
//! The bot is driven by `/cherry-pick <branch>` comments and answers failed
//! picks with a comment of its own.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/cherry-pick\s+(\w[\w.\-/]*)").expect("valid regex")
});

/// Extract the target branch from a `/cherry-pick <branch>` comment
///
/// The comment must start with the command once surrounding whitespace is
/// trimmed. Anything after the branch name is ignored.
pub fn parse_cherry_pick_comment(body: &str) -> Option<String> {
    COMMAND
        .captures(body.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Text of the comment posted when a cherry-pick fails
pub fn render_failure_comment(err: &Error) -> String {
    format!("Cherry-pick failed with `{}`", err.summary())
}

/// Tell the requester on `issue_number` why their cherry-pick failed
///
/// Only conflicts are reported; other errors are left to the caller. Returns
/// whether a comment was posted.
pub async fn report_failure(
    platform: &dyn PlatformService,
    issue_number: u64,
    err: &Error,
) -> Result<bool> {
    if !matches!(err, Error::Conflict { .. }) {
        debug!(issue_number, error = %err, "not reporting non-conflict failure");
        return Ok(false);
    }

    let body = render_failure_comment(err);
    if let Err(e) = platform.create_comment(issue_number, &body).await {
        warn!(issue_number, error = %e, "failed to post failure comment");
        return Err(e);
    }
    Ok(true)
}
