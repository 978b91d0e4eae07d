use serde::Deserialize;

use crate::GithubHandle;

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: GithubHandle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Labeled,
    #[serde(other)]
    Other,
}

/// Subset of the `pull_request` webhook payload the bot cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    #[serde(default)]
    pub label: Option<Label>,
    pub repository: Repository,
    pub pull_request: PullRequest,
}

impl PullRequestEvent {
    /// Coordinates for API calls. The pull request's API URL names the repository that
    /// actually hosts the PR, so it wins over the `repository` block when it parses.
    pub fn repo_info(&self) -> RepoInfo {
        RepoInfo::from_api_url(&self.pull_request.url, self.pull_request.number).unwrap_or_else(
            || {
                RepoInfo::new(
                    &self.repository.owner.login,
                    &self.repository.name,
                    self.pull_request.number,
                )
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub full_id: String,
}

impl RepoInfo {
    pub fn new(owner: &str, repo: &str, number: u64) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
            full_id: format!("{}/{}/{}", owner, repo, number),
        }
    }

    /// Parses `https://api.github.com/repos/{owner}/{repo}/pulls/{n}`.
    pub fn from_api_url(url: &str, number: u64) -> Option<Self> {
        let (_, path) = url.split_once("/repos/")?;
        let mut segments = path.trim_end_matches('/').split('/');
        let owner = segments.next().filter(|s| !s.is_empty())?;
        let repo = segments.next().filter(|s| !s.is_empty())?;
        Some(Self::new(owner, repo, number))
    }
}
