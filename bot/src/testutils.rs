use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::github::{
    Account, Label, PullRequest, PullRequestAction, PullRequestEvent, RepoInfo, Repository,
};

use crate::{
    api::{prometheus::PrometheusClient, GithubApi, NewIssue, Notifier},
    config::InvocationConfig,
    events::{actions::Action, Context, EmergencyEvent},
    messages::{Template, DEFAULT_ISSUE_BODY},
};

pub const PR_URL: &str = "https://github.com/robandpdx/superbigmono/pull/1";
pub const ISSUE_URL: &str = "https://github.com/robandpdx/superbigmono/issues/44";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Approve(String),
    CreateIssue(NewIssue),
    Merge(String),
    Notify(String),
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Approve(_) => "approve",
            Call::CreateIssue(_) => "issue",
            Call::Merge(_) => "merge",
            Call::Notify(_) => "notify",
        }
    }
}

/// Shared log of every external call, in the order they were made.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[derive(Default)]
pub struct FakeGithub {
    recorder: Recorder,
    fail_on: Option<Action>,
}

impl FakeGithub {
    pub fn failing_on(action: Action) -> Self {
        Self {
            fail_on: Some(action),
            ..Default::default()
        }
    }

    fn result(&self, action: Action) -> anyhow::Result<()> {
        if self.fail_on == Some(action) {
            anyhow::bail!("something awful happened");
        }
        Ok(())
    }
}

#[async_trait]
impl GithubApi for FakeGithub {
    async fn approve_pull_request(&self, pr: &RepoInfo) -> anyhow::Result<()> {
        self.recorder.push(Call::Approve(pr.full_id.clone()));
        self.result(Action::approve())
    }

    async fn create_issue(&self, _pr: &RepoInfo, issue: NewIssue) -> anyhow::Result<String> {
        self.recorder.push(Call::CreateIssue(issue));
        self.result(Action::create_issue())?;
        Ok(ISSUE_URL.to_string())
    }

    async fn merge_pull_request(&self, pr: &RepoInfo) -> anyhow::Result<()> {
        self.recorder.push(Call::Merge(pr.full_id.clone()));
        self.result(Action::merge())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    recorder: Recorder,
    fail: bool,
}

impl FakeNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        self.recorder.push(Call::Notify(text.to_string()));
        if self.fail {
            anyhow::bail!("channel_not_found");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Flags {
    pub approve: bool,
    pub issue: bool,
    pub merge: bool,
    pub notify: bool,
}

impl Flags {
    pub fn all() -> Self {
        Self {
            approve: true,
            issue: true,
            merge: true,
            notify: true,
        }
    }

    pub fn none() -> Self {
        Self {
            approve: false,
            issue: false,
            merge: false,
            notify: false,
        }
    }
}

pub fn config(flags: Flags) -> InvocationConfig {
    InvocationConfig {
        emergency_label: "emergency".to_string(),
        approval_enabled: flags.approve,
        issue_enabled: flags.issue,
        merge_enabled: flags.merge,
        notify_enabled: flags.notify,
        issue_title: "Emergency PR Audit".to_string(),
        issue_body_template: Template::new(DEFAULT_ISSUE_BODY),
        issue_assignees: vec!["tonyclifton".to_string(), "andykaufman".to_string()],
        notify_message_template: None,
    }
}

/// Wires both fakes to `recorder` so calls to GitHub and Slack land in one ordered log.
pub fn context(
    recorder: &Recorder,
    flags: Flags,
    github: FakeGithub,
    notifier: FakeNotifier,
) -> Context {
    let github = FakeGithub {
        recorder: recorder.clone(),
        ..github
    };
    let notifier = FakeNotifier {
        recorder: recorder.clone(),
        ..notifier
    };

    Context {
        github: Arc::new(github),
        notifier: Some(Arc::new(notifier)),
        config: Arc::new(config(flags)),
        prometheus: Arc::new(PrometheusClient::default()),
    }
}

pub fn pull_request_event(action: PullRequestAction, label: Option<&str>) -> PullRequestEvent {
    PullRequestEvent {
        action,
        label: label.map(|name| Label {
            name: name.to_string(),
        }),
        repository: Repository {
            name: "superbigmono".to_string(),
            owner: Account {
                login: "probot".to_string(),
            },
        },
        pull_request: PullRequest {
            number: 1,
            url: "https://api.github.com/repos/robandpdx/superbigmono/pulls/1".to_string(),
            html_url: PR_URL.to_string(),
        },
    }
}

pub fn emergency_event() -> EmergencyEvent {
    EmergencyEvent::from_event(
        pull_request_event(PullRequestAction::Labeled, Some("emergency")),
        "emergency",
    )
    .unwrap()
}
