//! Auth command - report which token is in use

use crate::cli::style::{Stylize, check};
use anstream::println;
use cherry_pick_bot::auth::{get_github_auth, test_github_auth};
use cherry_pick_bot::config::EngineConfig;
use cherry_pick_bot::error::Result;

/// Resolve the token and verify it against the API
pub async fn run_auth(config: &EngineConfig, token: Option<&str>) -> Result<()> {
    let auth = get_github_auth(token).await?;
    println!("{} {}", "Token source:".muted(), auth.source);

    let login = test_github_auth(&auth, config.api_url.as_deref()).await?;
    println!("{} Authenticated as {}", check(), login.accent());
    Ok(())
}
