use tracing::{info, instrument};

use crate::{
    api::NewIssue,
    events::{Context, EmergencyEvent},
    messages,
};

use super::ActionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditIssueCreate {}

impl AuditIssueCreate {
    #[instrument(skip(self, event, context), fields(pr = %event.pr.full_id))]
    pub async fn execute(
        &self,
        event: &EmergencyEvent,
        context: &Context,
    ) -> anyhow::Result<ActionOutcome> {
        let issue = Self::issue(event, context);
        let url = context.github.create_issue(&event.pr, issue).await?;
        info!("Opened audit issue {url} for {}", event.pr.full_id);
        Ok(ActionOutcome::IssueCreated { url })
    }

    pub fn issue(event: &EmergencyEvent, context: &Context) -> NewIssue {
        let config = &context.config;
        NewIssue {
            title: config.issue_title.clone(),
            body: messages::issue_body(
                &config.issue_body_template,
                &event.html_url,
                &event.label,
            ),
            labels: vec![config.emergency_label.clone()],
            assignees: config.issue_assignees.clone(),
        }
    }
}
