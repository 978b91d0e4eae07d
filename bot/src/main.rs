use std::sync::Arc;

use emergency_pr_bot::{
    api::{prometheus::PrometheusClient, GithubApi, GithubClient, Notifier},
    config::{Env, InvocationConfig},
    events::Context,
    webhook::{self, WebhookState},
};
use rocket::routes;
use shared::slack::SlackSubscriber;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;

    let alerts = match env.slack_alerts() {
        Some((token, channel)) => Some(SlackSubscriber::new(token, channel).await),
        None => None,
    };
    let subscriber = tracing_subscriber::registry()
        .with(alerts)
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let config = InvocationConfig::from_env(&env)?;
    info!(
        "Watching for label `{}` (approve: {}, issue: {}, merge: {}, notify: {})",
        config.emergency_label,
        config.approval_enabled,
        config.issue_enabled,
        config.merge_enabled,
        config.notify_enabled
    );
    if env.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET is not set. Deliveries will not be verified");
    }

    let prometheus: Arc<PrometheusClient> = Default::default();
    let github = Arc::new(GithubClient::new(env.github_token.clone(), prometheus.clone())?);
    let notifier = env
        .slack_client()?
        .map(|slack| Arc::new(slack) as Arc<dyn Notifier>);

    let context = Context {
        github: github.clone() as Arc<dyn GithubApi>,
        notifier,
        config: config.into(),
        prometheus,
    };
    let state = WebhookState {
        context,
        secret: env.webhook_secret.clone(),
    };

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::warn!("Received SIGINT. Exiting.");
        }
        result = rocket::build()
            .mount("/", routes![webhook::github_webhook, webhook::metrics])
            .mount("/api/github/webhooks", routes![webhook::github_webhook])
            .manage(state)
            .manage(github)
            .launch() => {
                if let Err(e) = result {
                    tracing::error!("Server stopped: {e}");
                }
            }
    }
    tracing::warn!("Exiting bot...");

    Ok(())
}
