//! Shared command context for CLI commands

use cherry_pick_bot::cherry_pick::CherryPickOptions;
use cherry_pick_bot::config::EngineConfig;
use cherry_pick_bot::error::Result;
use cherry_pick_bot::platform::{PlatformService, create_platform_service, parse_repo_slug};
use cherry_pick_bot::types::PlatformConfig;

/// Everything a command needs to talk to one repository
pub struct CommandContext {
    /// Repository coordinates
    pub repo: PlatformConfig,
    /// Platform service for the repository
    pub platform: Box<dyn PlatformService>,
    /// Engine options derived from the config file
    pub options: CherryPickOptions,
}

impl CommandContext {
    /// Resolve the repository and authenticate against it
    pub async fn new(config: &EngineConfig, repo: &str, token: Option<&str>) -> Result<Self> {
        let repo = parse_repo_slug(repo)?;
        let platform = create_platform_service(&repo, token, config.api_url.as_deref()).await?;

        Ok(Self {
            repo,
            platform,
            options: CherryPickOptions::from(config),
        })
    }

    /// `owner/repo`, for display
    pub fn slug(&self) -> String {
        format!("{}/{}", self.repo.owner, self.repo.repo)
    }
}
