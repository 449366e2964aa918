//! Multi-channel notification dispatch.
//!
//! Fan-out, not pipeline: each requested channel is attempted
//! independently and contributes exactly one result. A channel whose
//! backing service is unconfigured reports a successful mocked delivery
//! so the alert pipeline keeps moving in partially configured
//! environments.

pub mod formats;
pub mod transport;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Priority, TriggerType};
pub use transport::{ChannelTransport, NotificationTransport};

/// Slack audience sub-channels. Sales managers and quality/compliance
/// subscribe to different rooms, so routing picks one per alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlackChannel {
    Sales,
    Quality,
    Critical,
}

impl SlackChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlackChannel::Sales => "sales",
            SlackChannel::Quality => "quality",
            SlackChannel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for SlackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a channel needs beyond the message text
#[derive(Debug, Clone)]
pub struct NotificationMeta {
    pub center_name: String,
    pub priority: Priority,
    pub trigger_type: Option<TriggerType>,
    /// Email recipients
    pub recipients: Vec<String>,
    /// Push targets
    pub push_user_ids: Vec<Uuid>,
    pub action_items: Vec<String>,
    pub dashboard_url: Option<String>,
}

/// Outcome of one channel's delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub channel: String,
    pub success: bool,
    /// True when the channel was unconfigured and the message was only
    /// logged. Omitted from JSON for real deliveries.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            success: true,
            mocked: false,
            error: None,
            detail: None,
        }
    }

    pub fn delivered_with_detail(channel: &str, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::delivered(channel)
        }
    }

    pub fn mocked(channel: &str, detail: impl Into<String>) -> Self {
        Self {
            channel: channel.to_string(),
            success: true,
            mocked: true,
            error: None,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(channel: &str, error: impl Into<String>) -> Self {
        Self {
            channel: channel.to_string(),
            success: false,
            mocked: false,
            error: Some(error.into()),
            detail: None,
        }
    }
}

/// Pick the Slack sub-channel for an alert
pub fn route_slack_channel(
    trigger_type: Option<TriggerType>,
    priority: Priority,
) -> SlackChannel {
    match trigger_type {
        Some(TriggerType::ZeroSales) => SlackChannel::Critical,
        Some(
            TriggerType::LowSales | TriggerType::Milestone | TriggerType::BelowThresholdDuration,
        ) => SlackChannel::Sales,
        Some(TriggerType::HighDq | TriggerType::LowApproval) => SlackChannel::Quality,
        None if priority == Priority::Critical => SlackChannel::Critical,
        None => SlackChannel::Sales,
    }
}

/// Routes an alert to its requested channels and collects per-channel
/// results
pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self { transport }
    }

    /// Attempt every requested channel concurrently; one result per
    /// channel, failures isolated.
    pub async fn dispatch(
        &self,
        channels: &[String],
        message: &str,
        meta: &NotificationMeta,
    ) -> Vec<DeliveryResult> {
        let attempts = channels
            .iter()
            .map(|channel| self.deliver(channel, message, meta));
        let results = join_all(attempts).await;

        debug!(
            center = %meta.center_name,
            requested = channels.len(),
            ok = results.iter().filter(|r| r.success).count(),
            "dispatch complete"
        );
        results
    }

    async fn deliver(&self, channel: &str, message: &str, meta: &NotificationMeta) -> DeliveryResult {
        match channel {
            "slack" => {
                let sub_channel = route_slack_channel(meta.trigger_type, meta.priority);
                self.transport.slack(sub_channel, message, meta).await
            }
            "email" => {
                if meta.recipients.is_empty() {
                    return DeliveryResult::mocked("email", "no recipients resolved");
                }
                let subject = format!("Alert: {}", meta.center_name);
                let html = formats::email_html(message, meta);
                self.transport.email(&meta.recipients, &subject, &html).await
            }
            "push" => {
                if meta.push_user_ids.is_empty() {
                    return DeliveryResult::mocked("push", "no target users resolved");
                }
                let payload = formats::push_payload(message, meta);
                self.transport.web_push(&meta.push_user_ids, &payload).await
            }
            "whatsapp" => self.transport.whatsapp(message, meta).await,
            other => DeliveryResult::failed(other, format!("unknown channel: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sales_routes_to_critical() {
        assert_eq!(
            route_slack_channel(Some(TriggerType::ZeroSales), Priority::Low),
            SlackChannel::Critical
        );
    }

    #[test]
    fn sales_triggers_route_to_sales() {
        for t in [
            TriggerType::LowSales,
            TriggerType::Milestone,
            TriggerType::BelowThresholdDuration,
        ] {
            assert_eq!(route_slack_channel(Some(t), Priority::Critical), SlackChannel::Sales);
        }
    }

    #[test]
    fn quality_triggers_route_to_quality() {
        for t in [TriggerType::HighDq, TriggerType::LowApproval] {
            assert_eq!(route_slack_channel(Some(t), Priority::High), SlackChannel::Quality);
        }
    }

    #[test]
    fn no_trigger_falls_back_on_priority() {
        assert_eq!(
            route_slack_channel(None, Priority::Critical),
            SlackChannel::Critical
        );
        assert_eq!(route_slack_channel(None, Priority::Medium), SlackChannel::Sales);
    }

    #[test]
    fn mocked_flag_omitted_from_json_for_real_deliveries() {
        let real = serde_json::to_value(DeliveryResult::delivered("email")).unwrap();
        assert!(real.get("mocked").is_none());

        let mocked = serde_json::to_value(DeliveryResult::mocked("slack", "no webhook")).unwrap();
        assert_eq!(mocked.get("mocked"), Some(&serde_json::Value::Bool(true)));
    }
}
