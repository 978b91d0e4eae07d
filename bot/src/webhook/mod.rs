use std::sync::Arc;

use rocket::{
    data::{Data, ToByteUnit},
    http::{ContentType, Status},
    request::{FromRequest, Outcome, Request},
    State,
};
use shared::github::PullRequestEvent;
use tracing::{debug, error, info, warn};

use crate::{
    api::GithubClient,
    events::{handle_pull_request_event, Context, Handled},
};

pub use signature::Signature;

mod signature;

/// GitHub caps webhook payloads at 25 MB.
const MAX_PAYLOAD_MIB: u64 = 25;

pub struct WebhookState {
    pub context: Context,
    pub secret: Option<String>,
}

/// Delivery headers GitHub sends with every webhook.
#[derive(Debug, Clone, Copy)]
pub struct GithubHeaders<'r> {
    pub event: &'r str,
    pub delivery: Option<&'r str>,
    pub signature: Option<&'r str>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GithubHeaders<'r> {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();
        match headers.get_one("X-GitHub-Event") {
            Some(event) => Outcome::Success(GithubHeaders {
                event,
                delivery: headers.get_one("X-GitHub-Delivery"),
                signature: headers.get_one("X-Hub-Signature-256"),
            }),
            None => Outcome::Error((Status::BadRequest, "Missing X-GitHub-Event header")),
        }
    }
}

/// Verifies and routes one delivery. Only `pull_request` events reach the emergency workflow.
pub async fn dispatch(
    state: &WebhookState,
    headers: GithubHeaders<'_>,
    body: &[u8],
) -> (Status, String) {
    let delivery = headers.delivery.unwrap_or("unknown");

    if let Some(secret) = &state.secret {
        let Some(signature) = headers.signature else {
            warn!("Delivery {delivery} has no signature. Rejecting");
            return (Status::Unauthorized, "Missing signature".to_string());
        };
        match Signature(signature).is_valid(body, secret) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Delivery {delivery} has an invalid signature. Rejecting");
                return (Status::Unauthorized, "Invalid signature".to_string());
            }
            Err(e) => {
                warn!("Delivery {delivery} has a malformed signature: {e}");
                return (Status::Unauthorized, "Invalid signature".to_string());
            }
        }
    }

    match headers.event {
        "ping" => {
            info!("Received ping delivery {delivery}");
            (Status::Ok, "pong".to_string())
        }
        "pull_request" => {
            let event = match serde_json::from_slice::<PullRequestEvent>(body) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Failed to parse pull_request delivery {delivery}: {e}");
                    return (Status::BadRequest, format!("Invalid payload: {e}"));
                }
            };

            match handle_pull_request_event(&state.context, event).await {
                Ok(Handled::Ignored) => {
                    debug!("Delivery {delivery} is not an emergency. Ignoring");
                    (Status::Ok, "ignored".to_string())
                }
                Ok(Handled::Completed(report)) => (Status::Ok, report.to_string()),
                Err(e) => {
                    error!("Delivery {delivery} failed: {e}");
                    (Status::InternalServerError, e.to_string())
                }
            }
        }
        other => {
            debug!("Skipping {other} delivery {delivery}");
            (Status::Ok, "ignored".to_string())
        }
    }
}

#[rocket::post("/", data = "<data>")]
pub async fn github_webhook(
    headers: GithubHeaders<'_>,
    data: Data<'_>,
    state: &State<WebhookState>,
) -> (Status, String) {
    let body = match data.open(MAX_PAYLOAD_MIB.mebibytes()).into_bytes().await {
        Ok(body) if body.is_complete() => body.into_inner(),
        Ok(_) => return (Status::PayloadTooLarge, "Payload too large".to_string()),
        Err(e) => {
            error!("Failed to read webhook body: {e}");
            return (Status::BadRequest, "Failed to read body".to_string());
        }
    };

    dispatch(state, headers, &body).await
}

#[rocket::get("/metrics")]
pub async fn metrics(
    state: &State<WebhookState>,
    github: &State<Arc<GithubClient>>,
) -> Option<(ContentType, String)> {
    match github.get_rate_limits().await {
        Ok(rate_limits) => state
            .context
            .prometheus
            .set_read_requests(rate_limits.resources.core.used as i64),
        Err(e) => debug!("Failed to fetch rate limits: {e}"),
    }

    let metrics = state.context.prometheus.encode().ok()?;
    Some((
        ContentType::new("application", "openmetrics-text")
            .with_params([("version", "1.0.0"), ("charset", "utf-8")]),
        metrics,
    ))
}
