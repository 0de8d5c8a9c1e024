//! Scratch branch cleanup

use crate::cherry_pick::retry::with_retry;
use crate::error::Error;
use crate::platform::PlatformService;
use tracing::{debug, warn};

/// Delete the scratch branch `name`, best effort
///
/// Returns whether the branch is gone. A branch that no longer exists counts
/// as cleaned; any other failure is logged and swallowed.
pub async fn cleanup_temp_branch(platform: &dyn PlatformService, name: &str) -> bool {
    match with_retry("delete_ref", || platform.delete_ref(name)).await {
        Ok(()) => {
            debug!(name, "deleted temp branch");
            true
        }
        Err(Error::NotFound(_)) => {
            debug!(name, "temp branch already gone");
            true
        }
        Err(e) => {
            warn!(name, error = %e, "failed to delete temp branch");
            false
        }
    }
}
