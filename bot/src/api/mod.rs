use std::sync::Arc;

use async_trait::async_trait;
use octocrab::models::RateLimit;
use serde::{Deserialize, Serialize};
use shared::slack::SlackClient;
use tracing::{debug, instrument};

pub use shared::github::*;

pub mod prometheus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

/// The part of the created issue the bot reads back.
#[derive(Debug, Deserialize)]
struct CreatedIssue {
    number: u64,
    html_url: String,
}

/// The three mutating GitHub calls an emergency can make.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn approve_pull_request(&self, pr: &RepoInfo) -> anyhow::Result<()>;

    /// Returns the web URL of the created issue.
    async fn create_issue(&self, pr: &RepoInfo, issue: NewIssue) -> anyhow::Result<String>;

    async fn merge_pull_request(&self, pr: &RepoInfo) -> anyhow::Result<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
    prometheus: Arc<prometheus::PrometheusClient>,
}

impl GithubClient {
    pub fn new(
        github_token: String,
        prometheus: Arc<prometheus::PrometheusClient>,
    ) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(github_token)
            .build()?;

        Ok(Self {
            octocrab,
            prometheus,
        })
    }

    /// Client for a GitHub-compatible API rooted at `base_uri`.
    pub fn with_base_uri(
        github_token: String,
        base_uri: &str,
        prometheus: Arc<prometheus::PrometheusClient>,
    ) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .base_uri(base_uri)?
            .personal_token(github_token)
            .build()?;

        Ok(Self {
            octocrab,
            prometheus,
        })
    }

    pub async fn get_rate_limits(&self) -> anyhow::Result<RateLimit> {
        Ok(self.octocrab.ratelimit().get().await?)
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    #[instrument(skip(self, pr), fields(pr = %pr.full_id))]
    async fn approve_pull_request(&self, pr: &RepoInfo) -> anyhow::Result<()> {
        self.prometheus.add_write_request();
        let route = format!("/repos/{}/{}/pulls/{}/reviews", pr.owner, pr.repo, pr.number);
        let _review: serde_json::Value = self
            .octocrab
            .post(route, Some(&serde_json::json!({ "event": "APPROVE" })))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, pr, issue), fields(pr = %pr.full_id))]
    async fn create_issue(&self, pr: &RepoInfo, issue: NewIssue) -> anyhow::Result<String> {
        self.prometheus.add_write_request();
        let route = format!("/repos/{}/{}/issues", pr.owner, pr.repo);
        let issue: CreatedIssue = self.octocrab.post(route, Some(&issue)).await?;

        debug!("Created issue #{} for {}", issue.number, pr.full_id);
        Ok(issue.html_url)
    }

    #[instrument(skip(self, pr), fields(pr = %pr.full_id))]
    async fn merge_pull_request(&self, pr: &RepoInfo) -> anyhow::Result<()> {
        self.prometheus.add_write_request();
        let merge = self
            .octocrab
            .pulls(&pr.owner, &pr.repo)
            .merge(pr.number)
            .send()
            .await?;

        if !merge.merged {
            anyhow::bail!(
                "GitHub did not merge {}: {}",
                pr.full_id,
                merge.message.unwrap_or_default()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackClient {
    #[instrument(skip(self, text), fields(channel = %self.channel_id()))]
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        let response = self.post_message(text).await?;
        debug!(
            "Slack accepted message in {:?} at {:?}",
            response.channel, response.ts
        );
        Ok(())
    }
}
