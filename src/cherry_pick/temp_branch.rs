//! Scratch branch creation

use crate::cherry_pick::retry::with_retry;
use crate::config::StaleRefPolicy;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::TempBranch;
use tracing::{debug, warn};

/// Scratch branch used by a direct cherry-pick onto `target`
pub fn temp_branch_name(target: &str) -> String {
    format!("temp-{target}")
}

/// Create `name` at `sha`
///
/// Idempotent: a ref that already exists at `sha` is reused. A ref left at
/// some other commit is handled according to `policy`.
pub async fn create_temp_branch(
    platform: &dyn PlatformService,
    name: &str,
    sha: &str,
    policy: StaleRefPolicy,
) -> Result<TempBranch> {
    match with_retry("create_ref", || platform.create_ref(name, sha)).await {
        Ok(_) => {
            debug!(name, sha, "created temp branch");
            Ok(TempBranch {
                name: name.to_string(),
                base_sha: sha.to_string(),
                reused: false,
            })
        }
        Err(Error::AlreadyExists { .. }) => reconcile_existing(platform, name, sha, policy).await,
        Err(e) => Err(e),
    }
}

async fn reconcile_existing(
    platform: &dyn PlatformService,
    name: &str,
    sha: &str,
    policy: StaleRefPolicy,
) -> Result<TempBranch> {
    let existing = with_retry("get_ref", || platform.get_ref(name)).await?;
    if existing.sha == sha {
        debug!(name, sha, "reusing temp branch");
        return Ok(TempBranch {
            name: name.to_string(),
            base_sha: sha.to_string(),
            reused: true,
        });
    }

    match policy {
        StaleRefPolicy::Fail => Err(Error::AlreadyExists {
            name: name.to_string(),
            existing_sha: Some(existing.sha),
        }),
        StaleRefPolicy::Recreate => {
            warn!(name, stale = %existing.sha, expected = sha, "recreating stale temp branch");
            match with_retry("delete_ref", || platform.delete_ref(name)).await {
                Ok(()) | Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            with_retry("create_ref", || platform.create_ref(name, sha)).await?;
            Ok(TempBranch {
                name: name.to_string(),
                base_sha: sha.to_string(),
                reused: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_branch_name() {
        assert_eq!(temp_branch_name("target-branch"), "temp-target-branch");
        assert_eq!(temp_branch_name("release/1.2"), "temp-release/1.2");
    }
}
