//! GitHub token resolution

use super::AuthSource;
use crate::error::{Error, Result};
use octocrab::Octocrab;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// A resolved GitHub token
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// The token
    pub token: String,
    /// Where it came from
    pub source: AuthSource,
}

/// Resolve a GitHub token
///
/// Order: explicit value, `GITHUB_TOKEN`, `GH_TOKEN`, then `gh auth token`.
pub async fn get_github_auth(explicit: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(GitHubAuthConfig {
            token: token.to_string(),
            source: AuthSource::Explicit,
        });
    }

    for var in TOKEN_ENV_VARS {
        if let Ok(token) = std::env::var(var) {
            let token = token.trim();
            if !token.is_empty() {
                debug!(var, "using token from environment");
                return Ok(GitHubAuthConfig {
                    token: token.to_string(),
                    source: AuthSource::EnvVar,
                });
            }
        }
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .map_err(|e| Error::Auth(format!("no token in GITHUB_TOKEN/GH_TOKEN and gh CLI unavailable: {e}")))?;

    if !output.status.success() {
        return Err(Error::Auth(
            "no GitHub token found. Set GITHUB_TOKEN or run 'gh auth login'".to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("gh auth token returned an empty token".to_string()));
    }

    debug!("using token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}

/// Verify a token by fetching the authenticated user; returns the login
///
/// `api_base` selects a GitHub Enterprise API, e.g. `https://ghe.example.com/api/v3`.
pub async fn test_github_auth(config: &GitHubAuthConfig, api_base: Option<&str>) -> Result<String> {
    let mut builder = Octocrab::builder().personal_token(config.token.clone());
    if let Some(base) = api_base {
        builder = builder
            .base_uri(base)
            .map_err(|e| Error::Auth(e.to_string()))?;
    }
    let client = builder.build().map_err(|e| Error::Auth(e.to_string()))?;

    let user = client
        .current()
        .user()
        .await
        .map_err(|e| Error::Auth(format!("token rejected: {e}")))?;
    Ok(user.login)
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: tests touching the environment are serialized
        unsafe {
            for var in TOKEN_ENV_VARS {
                std::env::remove_var(var);
            }
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_explicit_token_wins() {
        clear_env();
        unsafe { std::env::set_var("GITHUB_TOKEN", "from-env") };

        let auth = get_github_auth(Some("explicit")).await.unwrap();
        assert_eq!(auth.token, "explicit");
        assert_eq!(auth.source, AuthSource::Explicit);
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_github_token_before_gh_token() {
        clear_env();
        unsafe {
            std::env::set_var("GITHUB_TOKEN", "primary");
            std::env::set_var("GH_TOKEN", "secondary");
        }

        let auth = get_github_auth(None).await.unwrap();
        assert_eq!(auth.token, "primary");
        assert_eq!(auth.source, AuthSource::EnvVar);
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_blank_values_are_skipped() {
        clear_env();
        unsafe {
            std::env::set_var("GITHUB_TOKEN", "  ");
            std::env::set_var("GH_TOKEN", "fallback");
        }

        let auth = get_github_auth(Some("")).await.unwrap();
        assert_eq!(auth.token, "fallback");
        clear_env();
    }
}
