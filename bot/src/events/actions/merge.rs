use tracing::{info, instrument};

use crate::events::{Context, EmergencyEvent};

use super::ActionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestMerge {}

impl PullRequestMerge {
    #[instrument(skip(self, event, context), fields(pr = %event.pr.full_id))]
    pub async fn execute(
        &self,
        event: &EmergencyEvent,
        context: &Context,
    ) -> anyhow::Result<ActionOutcome> {
        context.github.merge_pull_request(&event.pr).await?;
        info!("Merged {}", event.pr.full_id);
        Ok(ActionOutcome::Succeeded)
    }
}
