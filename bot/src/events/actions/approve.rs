use tracing::{info, instrument};

use crate::events::{Context, EmergencyEvent};

use super::ActionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestApprove {}

impl PullRequestApprove {
    #[instrument(skip(self, event, context), fields(pr = %event.pr.full_id))]
    pub async fn execute(
        &self,
        event: &EmergencyEvent,
        context: &Context,
    ) -> anyhow::Result<ActionOutcome> {
        context.github.approve_pull_request(&event.pr).await?;
        info!("Approved {}", event.pr.full_id);
        Ok(ActionOutcome::Succeeded)
    }
}
