use shared::github::{PullRequestAction, PullRequestEvent, RepoInfo};

/// A pull request that just received the emergency label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyEvent {
    pub pr: RepoInfo,
    pub label: String,
    pub url: String,
    pub html_url: String,
}

/// Label names are compared exactly, case included.
pub fn is_emergency(event: &PullRequestEvent, emergency_label: &str) -> bool {
    event.action == PullRequestAction::Labeled
        && event
            .label
            .as_ref()
            .is_some_and(|label| label.name == emergency_label)
}

impl EmergencyEvent {
    pub fn from_event(event: PullRequestEvent, emergency_label: &str) -> Option<Self> {
        if !is_emergency(&event, emergency_label) {
            return None;
        }

        let pr = event.repo_info();
        Some(Self {
            pr,
            label: event.label?.name,
            url: event.pull_request.url,
            html_url: event.pull_request.html_url,
        })
    }
}
