//! Error types for cherry-pick-bot

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced while cherry-picking through the hosting API
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// No commits were supplied
    #[error("no commits to cherry-pick")]
    EmptyInput,

    /// A commit, branch or ref could not be resolved
    #[error("not found: {0}")]
    NotFound(String),

    /// The host's merge reported a conflict for this commit
    #[error("merge conflict applying commit {commit}")]
    Conflict {
        /// The source commit that failed to apply
        commit: String,
    },

    /// A ref could not be created because it already exists
    #[error("ref {name} already exists{}", .existing_sha.as_deref().map(|s| format!(" at {s}")).unwrap_or_default())]
    AlreadyExists {
        /// Ref name, without the `refs/heads/` prefix
        name: String,
        /// Where the existing ref points, if known
        existing_sha: Option<String>,
    },

    /// Network failure or 5xx/rate-limit response; safe to retry once
    #[error("transient host error: {0}")]
    Transient(String),

    /// The token may not write to the repository or branch
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The target branch moved while commits were being replayed
    #[error("branch {branch} moved from {expected} to {actual} during cherry-pick")]
    TargetMoved {
        /// Target branch name
        branch: String,
        /// Tip captured at request start
        expected: String,
        /// Tip found at publish time
        actual: String,
    },

    /// The caller cancelled the request
    #[error("cherry-pick cancelled")]
    Cancelled,

    /// Unexpected response from the GitHub API
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Authentication failure
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the operation may succeed if retried
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Short human-readable summary suitable for a PR comment
    ///
    /// Never includes raw API payloads.
    pub fn summary(&self) -> String {
        match self {
            Self::Conflict { commit } => format!("Merge conflict applying commit {commit}"),
            Self::NotFound(what) => format!("Could not find {what}"),
            Self::PermissionDenied(_) => "Missing permission to write to the repository".to_string(),
            Self::TargetMoved { branch, .. } => {
                format!("Branch {branch} changed while cherry-picking, please retry")
            }
            Self::Transient(_) => "GitHub is temporarily unavailable, please retry".to_string(),
            other => other.to_string(),
        }
    }

    /// Map an HTTP status and API message to an error
    pub(crate) fn from_status(status: StatusCode, message: &str, what: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound(what.to_string()),
            StatusCode::UNAUTHORIZED => Self::PermissionDenied(message.to_string()),
            StatusCode::FORBIDDEN if message.to_lowercase().contains("rate limit") => {
                Self::Transient(message.to_string())
            }
            StatusCode::FORBIDDEN => Self::PermissionDenied(message.to_string()),
            StatusCode::TOO_MANY_REQUESTS => Self::Transient(message.to_string()),
            s if s.is_server_error() => Self::Transient(format!("{s}: {message}")),
            s => Self::GitHubApi(format!("{what}: {s}: {message}")),
        }
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                if source.status_code == StatusCode::UNPROCESSABLE_ENTITY
                    && reports_already_exists(&source)
                {
                    return Self::AlreadyExists {
                        name: String::new(),
                        existing_sha: None,
                    };
                }
                Self::from_status(source.status_code, &source.message, "GitHub resource")
            }
            // Everything else is transport-level: connection, TLS, body read
            other => Self::Transient(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::GitHubApi(format!("failed to decode response: {err}"));
        }
        match err.status() {
            Some(status) => Self::from_status(status, &err.to_string(), "GitHub resource"),
            None => Self::Transient(err.to_string()),
        }
    }
}

/// Whether a validation failure says the resource already exists
///
/// GitHub puts the detail in `errors[].message` and answers with a generic
/// top-level "Validation Failed".
fn reports_already_exists(source: &octocrab::GitHubError) -> bool {
    let mentions = |text: &str| text.to_lowercase().contains("already exists");
    mentions(&source.message)
        || source.errors.iter().flatten().any(|detail| {
            detail
                .get("message")
                .and_then(serde_json::Value::as_str)
                .is_some_and(mentions)
        })
}

/// Result type alias for cherry-pick-bot
pub type Result<T> = std::result::Result<T, Error>;
