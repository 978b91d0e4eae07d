use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};

const SLACK_API_URL: &str = "https://slack.com/api";

/// Response of `chat.postMessage`. Slack answers 200 even on failure, so `ok` must be checked.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

async fn post_message(
    client: &Client,
    url: &str,
    bot_token: &str,
    channel_id: &str,
    text: &str,
) -> anyhow::Result<PostMessageResponse> {
    let response = client
        .post(url)
        .bearer_auth(bot_token)
        .json(&serde_json::json!({
            "channel": channel_id,
            "text": text,
        }))
        .send()
        .await?
        .error_for_status()?;

    let response: PostMessageResponse = response.json().await?;
    if !response.ok {
        anyhow::bail!(
            "Slack rejected the message: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(response)
}

#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    post_message_url: String,
    bot_token: String,
    channel_id: String,
}

impl SlackClient {
    pub fn new(bot_token: String, channel_id: String) -> Self {
        Self::with_base_url(bot_token, channel_id, SLACK_API_URL)
    }

    /// Client for a Slack-compatible API rooted at `base_url`, e.g. `https://slack.com/api`.
    pub fn with_base_url(bot_token: String, channel_id: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            post_message_url: format!("{}/chat.postMessage", base_url.trim_end_matches('/')),
            bot_token,
            channel_id,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub async fn post_message(&self, text: &str) -> anyhow::Result<PostMessageResponse> {
        post_message(
            &self.client,
            &self.post_message_url,
            &self.bot_token,
            &self.channel_id,
            text,
        )
        .await
    }
}

/// Escapes the three characters Slack treats as control sequences in `mrkdwn`.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn alert_text(message: &str, level: &Level) -> String {
    // Inline code cannot contain backticks
    let message = escape(message).replace('`', "'");
    format!("*{}*: `{}`", level.as_str(), message)
}

#[derive(Clone)]
pub struct SlackSubscriber {
    sender: mpsc::UnboundedSender<(String, Level)>,
}

async fn sender_task(mut reader: mpsc::UnboundedReceiver<(String, Level)>, slack: SlackClient) {
    while let Some((message, level)) = reader.recv().await {
        let text = alert_text(&message, &level);
        // We use eprintln! here because it doesn't make sense to send back a message to the chat
        if let Err(e) = slack.post_message(&text).await {
            eprintln!("Failed to send alert to Slack: {e}");
        }
    }
}

impl SlackSubscriber {
    pub async fn new(bot_token: String, channel_id: String) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(sender_task(
            receiver,
            SlackClient::new(bot_token, channel_id),
        ));
        Self { sender }
    }

    pub fn send_to_slack(&self, message: &str, level: &Level) {
        let _ = self.sender.send((message.to_string(), *level));
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for SlackSubscriber {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let message = format!("{}", visitor);

        // Only warnings and errors are worth waking somebody up
        let level = event.metadata().level();
        if level <= &Level::WARN {
            self.send_to_slack(&message, level);
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl fmt::Display for MessageVisitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
