//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    Commit, GitRef, Identity, MergeOutcome, NewCommit, PlatformConfig, PullRequest,
    PullRequestDraft,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.github.com";

// Git Data API response types

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct ShaObject {
    sha: String,
}

#[derive(Deserialize)]
struct RefResponse {
    #[serde(rename = "ref")]
    ref_name: String,
    object: ShaObject,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    message: String,
    author: Identity,
    committer: Identity,
    tree: ShaObject,
    parents: Vec<ShaObject>,
}

impl From<CommitResponse> for Commit {
    fn from(c: CommitResponse) -> Self {
        Self {
            sha: c.sha,
            message: c.message,
            author: c.author,
            committer: c.committer,
            parents: c.parents.into_iter().map(|p| p.sha).collect(),
            tree_sha: c.tree.sha,
        }
    }
}

#[derive(Deserialize)]
struct MergeResponse {
    sha: String,
    commit: MergeCommitDetail,
}

#[derive(Deserialize)]
struct MergeCommitDetail {
    tree: ShaObject,
}

#[derive(Deserialize)]
struct BranchProtection {
    required_pull_request_reviews: Option<serde_json::Value>,
}

impl RefResponse {
    fn into_git_ref(self) -> GitRef {
        GitRef {
            name: self
                .ref_name
                .strip_prefix("refs/heads/")
                .unwrap_or(&self.ref_name)
                .to_string(),
            sha: self.object.sha,
        }
    }
}

/// GitHub service using octocrab for pull requests and raw HTTP for Git Data
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (Git Data API)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API base URL, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `host` selects a GitHub Enterprise instance; `None` means github.com.
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = host
            .as_ref()
            .map_or_else(|| DEFAULT_API_BASE.to_string(), |h| format!("https://{h}/api/v3"));
        Self::with_api_base(token, PlatformConfig { owner, repo, host }, &api_base)
    }

    /// Create a service against an explicit API base URL
    pub fn with_api_base(token: &str, config: PlatformConfig, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("cherry-pick-bot")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            token: token.to_string(),
            http_client,
            api_base,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{path}",
            self.api_base, self.config.owner, self.config.repo
        )
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let mut request = self
            .http_client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| Error::Transient(format!("request to {url} failed: {e}")))
    }
}

/// Encode a branch name for use in a URL path, keeping `/` separators
fn encode_branch(branch: &str) -> String {
    branch
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read an error response into our error type
async fn api_error(response: Response, what: &str) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);
    debug!(%status, %message, what, "GitHub API returned an error");
    Error::from_status(status, &message, what)
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_ref(&self, branch: &str) -> Result<GitRef> {
        debug!(branch, "getting ref");
        let url = self.repo_url(&format!("git/ref/heads/{}", encode_branch(branch)));
        let response = self.send(Method::GET, &url, None).await?;

        if !response.status().is_success() {
            return Err(api_error(response, &format!("branch {branch}")).await);
        }

        let git_ref = response.json::<RefResponse>().await?.into_git_ref();
        debug!(branch, sha = %git_ref.sha, "got ref");
        Ok(git_ref)
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<GitRef> {
        debug!(branch, sha, "creating ref");
        let url = self.repo_url("git/refs");
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        let response = self.send(Method::POST, &url, Some(&body)).await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let err = api_error(response, &format!("branch {branch}")).await;
            if err.to_string().to_lowercase().contains("already exists") {
                return Err(Error::AlreadyExists {
                    name: branch.to_string(),
                    existing_sha: None,
                });
            }
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(api_error(response, &format!("commit {sha}")).await);
        }

        debug!(branch, sha, "created ref");
        Ok(GitRef {
            name: branch.to_string(),
            sha: sha.to_string(),
        })
    }

    async fn update_ref(&self, branch: &str, sha: &str, force: bool) -> Result<GitRef> {
        debug!(branch, sha, force, "updating ref");
        let url = self.repo_url(&format!("git/refs/heads/{}", encode_branch(branch)));
        let body = json!({ "sha": sha, "force": force });
        let response = self.send(Method::PATCH, &url, Some(&body)).await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let err = api_error(response, &format!("branch {branch}")).await;
            let text = err.to_string().to_lowercase();
            if text.contains("does not exist") {
                return Err(Error::NotFound(format!("branch {branch}")));
            }
            if text.contains("protected branch") {
                return Err(Error::PermissionDenied(format!(
                    "branch {branch} is protected"
                )));
            }
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(api_error(response, &format!("branch {branch}")).await);
        }

        debug!(branch, sha, "updated ref");
        Ok(GitRef {
            name: branch.to_string(),
            sha: sha.to_string(),
        })
    }

    async fn delete_ref(&self, branch: &str) -> Result<()> {
        debug!(branch, "deleting ref");
        let url = self.repo_url(&format!("git/refs/heads/{}", encode_branch(branch)));
        let response = self.send(Method::DELETE, &url, None).await?;

        // GitHub answers 422 "Reference does not exist" for a missing ref
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(Error::NotFound(format!("branch {branch}")));
        }
        if !response.status().is_success() {
            return Err(api_error(response, &format!("branch {branch}")).await);
        }

        debug!(branch, "deleted ref");
        Ok(())
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit> {
        debug!(sha, "getting commit");
        let url = self.repo_url(&format!("git/commits/{sha}"));
        let response = self.send(Method::GET, &url, None).await?;

        if !response.status().is_success() {
            return Err(api_error(response, &format!("commit {sha}")).await);
        }

        let commit: Commit = response.json::<CommitResponse>().await?.into();
        debug!(sha, tree = %commit.tree_sha, "got commit");
        Ok(commit)
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String> {
        debug!(tree = %commit.tree, parents = ?commit.parents, "creating commit");
        let url = self.repo_url("git/commits");
        let body = serde_json::to_value(commit)
            .map_err(|e| Error::Internal(format!("failed to serialize commit: {e}")))?;
        let response = self.send(Method::POST, &url, Some(&body)).await?;

        if !response.status().is_success() {
            return Err(api_error(response, &format!("tree {}", commit.tree)).await);
        }

        let created: ShaObject = response.json().await?;
        debug!(sha = %created.sha, "created commit");
        Ok(created.sha)
    }

    async fn merge(&self, base: &str, head: &str, message: &str) -> Result<MergeOutcome> {
        debug!(base, head, "merging");
        let url = self.repo_url("merges");
        let body = json!({ "base": base, "head": head, "commit_message": message });
        let response = self.send(Method::POST, &url, Some(&body)).await?;

        match response.status() {
            StatusCode::CONFLICT => {
                debug!(base, head, "merge conflict");
                Ok(MergeOutcome::Conflict)
            }
            StatusCode::NO_CONTENT => {
                debug!(base, head, "nothing to merge");
                Ok(MergeOutcome::NothingToMerge)
            }
            s if s.is_success() => {
                let merged: MergeResponse = response.json().await?;
                debug!(base, head, sha = %merged.sha, "merged");
                Ok(MergeOutcome::Clean {
                    sha: merged.sha,
                    tree_sha: merged.commit.tree.sha,
                })
            }
            _ => Err(api_error(response, &format!("merge of {head} into {base}")).await),
        }
    }

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequest> {
        debug!(head = %draft.head, base = %draft.base, "creating PR");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .create(&draft.title, &draft.head, &draft.base)
            .body(&draft.body)
            .send()
            .await
            .map_err(|e| match Error::from(e) {
                Error::AlreadyExists { existing_sha, .. } => Error::AlreadyExists {
                    name: draft.head.clone(),
                    existing_sha,
                },
                other => other,
            })?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        debug!(head_branch, "finding existing PR");
        let head = format!("{}:{}", &self.config.owner, head_branch);

        let prs = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .head(head)
            .state(octocrab::params::State::Open)
            .send()
            .await?;

        let result = prs.items.first().map(pr_from_octocrab);
        if let Some(ref pr) = result {
            debug!(pr_number = pr.number, "found existing PR");
        } else {
            debug!("no existing PR found");
        }
        Ok(result)
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        debug!(issue_number, "creating comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(issue_number, body)
            .await?;
        debug!(issue_number, "created comment");
        Ok(())
    }

    async fn branch_requires_reviews(&self, branch: &str) -> Result<bool> {
        debug!(branch, "checking branch protection");
        let url = self.repo_url(&format!("branches/{}/protection", encode_branch(branch)));
        let response = self.send(Method::GET, &url, None).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(branch, "branch not protected");
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(api_error(response, &format!("protection of branch {branch}")).await);
        }

        let protection: BranchProtection = response.json().await?;
        let required = protection.required_pull_request_reviews.is_some();
        debug!(branch, required, "branch protection result");
        Ok(required)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
