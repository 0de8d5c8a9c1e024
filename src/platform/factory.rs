//! Platform service construction

use crate::auth::get_github_auth;
use crate::error::Result;
use crate::platform::{GitHubService, PlatformService};
use crate::types::PlatformConfig;
use tracing::debug;

/// Create a platform service for the repository
///
/// Resolves a token (explicit, environment or `gh` CLI) and targets
/// `api_url` when given, otherwise github.com or the enterprise host in
/// `config`.
pub async fn create_platform_service(
    config: &PlatformConfig,
    explicit_token: Option<&str>,
    api_url: Option<&str>,
) -> Result<Box<dyn PlatformService>> {
    let auth = get_github_auth(explicit_token).await?;
    debug!(source = ?auth.source, owner = %config.owner, repo = %config.repo, "creating GitHub service");

    let service = match api_url {
        Some(url) => GitHubService::with_api_base(&auth.token, config.clone(), url)?,
        None => GitHubService::new(
            &auth.token,
            config.owner.clone(),
            config.repo.clone(),
            config.host.clone(),
        )?,
    };
    Ok(Box::new(service))
}
