use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::time::Duration;

use crate::alarm_loop::{AlarmHandler, Outcome};
use crate::config::EscalationConfig;
use crate::error::DeliveryError;
use crate::event::{AlarmEvent, AlarmStatus, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Notify,
    Skip,
}

/// One row of the escalation table. `severities: None` matches any severity,
/// including a missing or unrecognised one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub status: AlarmStatus,
    pub severities: Option<Vec<Severity>>,
    pub action: Action,
}

impl PolicyRule {
    fn matches(&self, status: AlarmStatus, severity: Option<Severity>) -> bool {
        if self.status != status {
            return false;
        }
        match (&self.severities, severity) {
            (None, _) => true,
            (Some(allowed), Some(severity)) => allowed.contains(&severity),
            (Some(_), None) => false,
        }
    }
}

/// Ordered rules, first match wins, no match means skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationPolicy {
    rules: Vec<PolicyRule>,
}

impl EscalationPolicy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn decide(&self, status: Option<AlarmStatus>, severity: Option<Severity>) -> Action {
        let Some(status) = status else {
            return Action::Skip;
        };
        self.rules
            .iter()
            .find(|rule| rule.matches(status, severity))
            .map(|rule| rule.action)
            .unwrap_or(Action::Skip)
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(vec![
            PolicyRule {
                status: AlarmStatus::Raised,
                severities: Some(vec![Severity::Critical, Severity::Major]),
                action: Action::Notify,
            },
            PolicyRule {
                status: AlarmStatus::Raised,
                severities: Some(vec![Severity::Minor, Severity::Warning]),
                action: Action::Skip,
            },
            PolicyRule { status: AlarmStatus::Cleared, severities: None, action: Action::Skip },
            PolicyRule { status: AlarmStatus::Acked, severities: None, action: Action::Skip },
        ])
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage {
    text: String,
}

/// Chat webhook endpoint with a bounded request timeout.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn post_text(&self, text: String) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookMessage { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

pub fn summary_text(event: &AlarmEvent) -> String {
    fn or_na(value: Option<&str>) -> &str {
        value.unwrap_or("n/a")
    }
    format!(
        "Alarm {} - {} - severity={} status={}",
        event.id_label(),
        or_na(event.event_type.as_deref()),
        or_na(event.raw_severity.as_deref()),
        or_na(event.raw_status.as_deref()),
    )
}

pub struct EscalationNotifier {
    webhook: Option<WebhookClient>,
    policy: EscalationPolicy,
}

impl EscalationNotifier {
    pub fn new(webhook: Option<WebhookClient>, policy: EscalationPolicy) -> Self {
        Self { webhook, policy }
    }

    pub fn from_config(config: &EscalationConfig) -> Result<Self> {
        let webhook = match config.webhook_url() {
            Some(url) => Some(WebhookClient::new(url, config.timeout())?),
            None => {
                warn!("Escalation webhook not configured; notifications are disabled");
                None
            }
        };
        Ok(Self::new(webhook, EscalationPolicy::default()))
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// Sends the summary for `event`. Without a webhook this is a no-op skip.
    pub async fn notify(&self, event: &AlarmEvent) -> Result<Outcome, DeliveryError> {
        let Some(webhook) = &self.webhook else {
            debug!("Webhook not configured; skipping notify for alarm {}", event.id_label());
            return Ok(Outcome::Skipped("webhook not configured"));
        };

        webhook.post_text(summary_text(event)).await?;
        info!("Sent escalation notification for alarm {}", event.id_label());
        Ok(Outcome::Delivered)
    }
}

#[async_trait]
impl AlarmHandler for EscalationNotifier {
    fn name(&self) -> &str {
        "escalation-notifier"
    }

    async fn handle(&self, event: &AlarmEvent) -> Result<Outcome, DeliveryError> {
        // "now" only stands in for a missing timestamp in this log line.
        let seen_at = event
            .timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        debug!(
            "Alarm {} at {}: status={:?} severity={:?}",
            event.id_label(),
            seen_at,
            event.raw_status,
            event.raw_severity
        );

        match self.policy.decide(event.status(), event.severity()) {
            Action::Notify => self.notify(event).await,
            Action::Skip => Ok(Outcome::Skipped("policy")),
        }
    }
}
