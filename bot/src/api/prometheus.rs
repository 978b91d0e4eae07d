use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;
use shared::github::RepoInfo;

use crate::events::actions::Action;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum ActionType {
    Approve,
    CreateIssue,
    Merge,
    Notify,
}

impl From<&Action> for ActionType {
    fn from(action: &Action) -> Self {
        match action {
            Action::Approve(_) => ActionType::Approve,
            Action::CreateIssue(_) => ActionType::CreateIssue,
            Action::Merge(_) => ActionType::Merge,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MetricRecord {
    pub action: ActionType,
    pub organization: String,
    pub repository: String,
    pub pr_number: u64,
    pub success: u32,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TimeMetric {
    pub success: u32,
}

pub struct PrometheusClient {
    registry: Registry,
    action: Family<MetricRecord, Counter>,
    invocation_processing_time: Family<TimeMetric, Histogram>,

    // We can get this from the github api so we can track it as gauge
    github_api_read_request: Gauge,
    // GitHub doesn't report secondary rate limits in the rate-limit response,
    // so every mutating request is counted here
    github_api_write_request: Counter,
}

impl Default for PrometheusClient {
    fn default() -> Self {
        let mut registry = Registry::default();
        let action = Family::default();
        let github_api_read_request = Gauge::default();
        let github_api_write_request = Counter::default();
        let invocation_processing_time: Family<TimeMetric, Histogram> =
            Family::new_with_constructor(|| {
                Histogram::new([0.1, 0.25, 0.5, 1., 2.5, 5., 10., 30., f64::INFINITY].into_iter())
            });

        registry.register(
            "github_api_read_requests",
            "Display used github read requests at a metric time",
            github_api_read_request.clone(),
        );
        registry.register(
            "github_api_write_requests",
            "Display total used github write requests from the start at a metric time",
            github_api_write_request.clone(),
        );
        registry.register(
            "bot_action",
            "Emergency actions attempted by the bot",
            action.clone(),
        );
        registry.register(
            "bot_invocation_processing_time",
            "Processing time for matched emergency events",
            invocation_processing_time.clone(),
        );
        Self {
            registry,
            action,
            invocation_processing_time,
            github_api_read_request,
            github_api_write_request,
        }
    }
}

impl PrometheusClient {
    pub fn record(&self, action: ActionType, pr: &RepoInfo, success: bool) {
        let record = MetricRecord {
            action,
            organization: pr.owner.clone(),
            repository: pr.repo.clone(),
            pr_number: pr.number,
            success: success as u32,
        };
        self.action.get_or_create(&record).inc();
    }

    pub fn record_invocation(&self, success: bool, started: chrono::DateTime<chrono::Utc>) {
        let time = chrono::Utc::now() - started;
        self.invocation_processing_time
            .get_or_create(&TimeMetric {
                success: success as u32,
            })
            .observe(time.num_milliseconds() as f64 / 1000.0);
    }

    pub fn add_write_request(&self) {
        self.github_api_write_request.inc();
    }

    pub fn set_read_requests(&self, value: i64) {
        self.github_api_read_request.set(value);
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_recorded_actions() {
        let prometheus = PrometheusClient::default();
        let pr = RepoInfo::new("robandpdx", "superbigmono", 1);

        prometheus.record(ActionType::Merge, &pr, true);
        prometheus.add_write_request();
        prometheus.record_invocation(true, chrono::Utc::now());

        let body = prometheus.encode().unwrap();
        assert!(body.contains("bot_action_total{"));
        assert!(body.contains("action=\"Merge\""));
        assert!(body.contains("repository=\"superbigmono\""));
        assert!(body.contains("github_api_write_requests_total 1"));
        assert!(body.contains("bot_invocation_processing_time_count{success=\"1\"} 1"));
    }

    #[test]
    fn action_types_follow_actions() {
        assert_eq!(ActionType::from(&Action::approve()), ActionType::Approve);
        assert_eq!(ActionType::from(&Action::create_issue()), ActionType::CreateIssue);
        assert_eq!(ActionType::from(&Action::merge()), ActionType::Merge);
    }
}
