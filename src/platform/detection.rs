//! Repository coordinate parsing

use crate::error::{Error, Result};
use crate::types::PlatformConfig;
use url::Url;

/// Parse repository coordinates
///
/// Accepts `owner/repo`, `https://<host>/owner/repo[.git]` and
/// `git@<host>:owner/repo[.git]`. A host other than github.com is kept so the
/// service can target GitHub Enterprise.
pub fn parse_repo_slug(input: &str) -> Result<PlatformConfig> {
    let input = input.trim();

    let (host, path) = if let Some(rest) = input.strip_prefix("git@") {
        let (host, path) = rest
            .split_once(':')
            .ok_or_else(|| Error::Config(format!("invalid ssh remote: {input}")))?;
        (Some(host.to_string()), path.to_string())
    } else if input.contains("://") {
        let url = Url::parse(input).map_err(|e| Error::Config(format!("invalid URL {input}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("URL has no host: {input}")))?;
        (Some(host.to_string()), url.path().to_string())
    } else {
        (None, input.to_string())
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/').filter(|p| !p.is_empty());

    let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::Config(format!(
            "expected repository as owner/repo, got '{input}'"
        )));
    };

    Ok(PlatformConfig {
        owner: owner.to_string(),
        repo: repo.to_string(),
        host: host.filter(|h| h != "github.com"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_slug() {
        let config = parse_repo_slug("testOwner/testRepo").unwrap();
        assert_eq!(config.owner, "testOwner");
        assert_eq!(config.repo, "testRepo");
        assert!(config.host.is_none());
    }

    #[test]
    fn test_https_url_with_git_extension() {
        let config = parse_repo_slug("https://github.com/owner/repo.git").unwrap();
        assert_eq!(config.owner, "owner");
        assert_eq!(config.repo, "repo");
        assert!(config.host.is_none());
    }

    #[test]
    fn test_ssh_enterprise_host() {
        let config = parse_repo_slug("git@github.example.com:team/project.git").unwrap();
        assert_eq!(config.owner, "team");
        assert_eq!(config.repo, "project");
        assert_eq!(config.host.as_deref(), Some("github.example.com"));
    }

    #[test]
    fn test_trailing_slash() {
        let config = parse_repo_slug("https://github.com/owner/repo/").unwrap();
        assert_eq!(config.repo, "repo");
    }

    #[test]
    fn test_rejects_missing_repo() {
        assert!(matches!(parse_repo_slug("owner"), Err(Error::Config(_))));
        assert!(matches!(parse_repo_slug("a/b/c"), Err(Error::Config(_))));
    }
}
