mod approve;
mod issue;
mod merge;

use crate::config::InvocationConfig;

use super::{Context, EmergencyEvent};

pub use approve::*;
pub use issue::*;
pub use merge::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    IssueCreated { url: String },
}

impl ActionOutcome {
    pub fn issue_url(&self) -> Option<&str> {
        match self {
            ActionOutcome::IssueCreated { url } => Some(url),
            ActionOutcome::Succeeded => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Approve(PullRequestApprove),
    CreateIssue(AuditIssueCreate),
    Merge(PullRequestMerge),
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Approve(_) => write!(f, "Approve"),
            Action::CreateIssue(_) => write!(f, "CreateIssue"),
            Action::Merge(_) => write!(f, "Merge"),
        }
    }
}

impl Action {
    pub fn approve() -> Self {
        Self::Approve(PullRequestApprove {})
    }

    pub fn create_issue() -> Self {
        Self::CreateIssue(AuditIssueCreate {})
    }

    pub fn merge() -> Self {
        Self::Merge(PullRequestMerge {})
    }

    /// Every action in the order it runs, whether enabled or not.
    pub fn sequence() -> [Action; 3] {
        [Self::approve(), Self::create_issue(), Self::merge()]
    }

    pub fn is_enabled(&self, config: &InvocationConfig) -> bool {
        match self {
            Action::Approve(_) => config.approval_enabled,
            Action::CreateIssue(_) => config.issue_enabled,
            Action::Merge(_) => config.merge_enabled,
        }
    }

    pub async fn execute(
        &self,
        event: &EmergencyEvent,
        context: &Context,
    ) -> anyhow::Result<ActionOutcome> {
        match self {
            Action::Approve(action) => action.execute(event, context).await,
            Action::CreateIssue(action) => action.execute(event, context).await,
            Action::Merge(action) => action.execute(event, context).await,
        }
    }
}
