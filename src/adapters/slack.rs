//! Slack incoming-webhook notifications.
//!
//! One webhook URL per audience sub-channel. A missing URL downgrades
//! that sub-channel to a mocked delivery: the payload is logged and the
//! pipeline continues.

use reqwest::Client;
use tracing::{debug, error, info};

use crate::config::SlackConfig;
use crate::dispatch::{formats, DeliveryResult, NotificationMeta, SlackChannel};

/// Slack notification client
#[derive(Clone)]
pub struct SlackNotifier {
    client: Client,
    config: SlackConfig,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn webhook_for(&self, channel: SlackChannel) -> Option<&str> {
        match channel {
            SlackChannel::Sales => self.config.webhook_sales.as_deref(),
            SlackChannel::Quality => self.config.webhook_quality.as_deref(),
            SlackChannel::Critical => self.config.webhook_critical.as_deref(),
        }
    }

    /// Send a block-kit message to the sub-channel's webhook
    pub async fn send(
        &self,
        channel: SlackChannel,
        message: &str,
        meta: &NotificationMeta,
    ) -> DeliveryResult {
        let Some(webhook_url) = self.webhook_for(channel) else {
            info!(%channel, body = message, "slack webhook not configured, delivery mocked");
            return DeliveryResult::mocked(
                "slack",
                format!("no webhook configured for {channel}"),
            );
        };

        let payload = formats::slack_blocks(message, meta);
        match self.client.post(webhook_url).json(&payload).send().await {
            Ok(resp) => {
                if resp.status().is_success() {
                    debug!(%channel, "slack notification sent");
                    DeliveryResult::delivered_with_detail("slack", channel.as_str())
                } else {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    error!(%channel, %status, body, "slack notification failed");
                    DeliveryResult::failed("slack", format!("HTTP {status}: {body}"))
                }
            }
            Err(e) => {
                error!(%channel, error = %e, "slack request failed");
                DeliveryResult::failed("slack", e.to_string())
            }
        }
    }
}
