use std::sync::Arc;

use shared::github::PullRequestEvent;
use tracing::{debug, error, info, instrument};

use crate::{
    api::{
        prometheus::{ActionType, PrometheusClient},
        GithubApi, Notifier,
    },
    config::InvocationConfig,
    messages,
};

use self::actions::{Action, ActionOutcome};

pub mod actions;
mod filter;

pub use filter::*;

#[derive(Clone)]
pub struct Context {
    pub github: Arc<dyn GithubApi>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub config: Arc<InvocationConfig>,
    pub prometheus: Arc<PrometheusClient>,
}

#[derive(Debug, thiserror::Error)]
pub enum EmergencyError {
    #[error("{action} failed for {pr}: {cause:#}")]
    Action {
        action: Action,
        pr: String,
        cause: anyhow::Error,
    },
    #[error("Slack notification failed for {pr}: {cause:#}")]
    Notification { pr: String, cause: anyhow::Error },
}

impl EmergencyError {
    pub fn action(&self) -> Option<Action> {
        match self {
            EmergencyError::Action { action, .. } => Some(*action),
            EmergencyError::Notification { .. } => None,
        }
    }
}

/// What happened during one invocation. Skipped actions leave no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationReport {
    pub actions: Vec<(Action, ActionOutcome)>,
    pub issue_url: Option<String>,
    pub notified: bool,
}

impl std::fmt::Display for InvocationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let actions = self
            .actions
            .iter()
            .map(|(action, _)| action.to_string())
            .collect::<Vec<_>>();
        write!(f, "actions: [{}]", actions.join(", "))?;
        if let Some(url) = &self.issue_url {
            write!(f, ", issue: {url}")?;
        }
        write!(f, ", notified: {}", self.notified)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Ignored,
    Completed(InvocationReport),
}

impl EmergencyEvent {
    /// Runs the enabled actions in order and stops at the first failure.
    #[instrument(skip(self, context), fields(pr = %self.pr.full_id))]
    pub async fn execute(&self, context: &Context) -> Result<InvocationReport, EmergencyError> {
        let mut report = InvocationReport::default();

        for action in Action::sequence() {
            if !action.is_enabled(&context.config) {
                debug!("{action} is disabled. Skipping");
                continue;
            }

            let result = action.execute(self, context).await;
            context
                .prometheus
                .record((&action).into(), &self.pr, result.is_ok());

            let outcome = result.map_err(|cause| EmergencyError::Action {
                action,
                pr: self.pr.full_id.clone(),
                cause,
            })?;
            if let Some(url) = outcome.issue_url() {
                report.issue_url = Some(url.to_string());
            }
            report.actions.push((action, outcome));
        }

        report.notified = self.notify(context, report.issue_url.as_deref()).await?;
        Ok(report)
    }

    async fn notify(
        &self,
        context: &Context,
        issue_url: Option<&str>,
    ) -> Result<bool, EmergencyError> {
        if !context.config.notify_enabled {
            debug!("Slack notifications are disabled. Skipping");
            return Ok(false);
        }

        let text = messages::notification_text(
            context.config.notify_message_template.as_ref(),
            &self.html_url,
            &self.label,
            issue_url,
        );

        let result = match &context.notifier {
            Some(notifier) => notifier.notify(&text).await,
            None => Err(anyhow::anyhow!("No Slack client is configured")),
        };
        context
            .prometheus
            .record(ActionType::Notify, &self.pr, result.is_ok());

        result.map_err(|cause| EmergencyError::Notification {
            pr: self.pr.full_id.clone(),
            cause,
        })?;
        Ok(true)
    }
}

/// Entry point for a decoded `pull_request` webhook.
pub async fn handle_pull_request_event(
    context: &Context,
    event: PullRequestEvent,
) -> Result<Handled, EmergencyError> {
    let Some(event) = EmergencyEvent::from_event(event, &context.config.emergency_label) else {
        return Ok(Handled::Ignored);
    };

    info!(
        "{} was labeled as {}. Starting emergency workflow",
        event.pr.full_id, event.label
    );
    let started = chrono::Utc::now();
    let result = event.execute(context).await;
    context
        .prometheus
        .record_invocation(result.is_ok(), started);

    match result {
        Ok(report) => {
            info!(
                "Finished emergency workflow for {}: {report}",
                event.pr.full_id
            );
            Ok(Handled::Completed(report))
        }
        Err(e) => {
            error!("Emergency workflow stopped: {e}");
            Err(e)
        }
    }
}
