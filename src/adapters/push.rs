//! Web Push notifications.
//!
//! Requires a VAPID key pair; without one every send is mocked. Each
//! target user may hold several browser subscriptions; the payload is
//! posted to each endpoint and subscriptions the push service reports
//! gone (404/410) are deactivated.

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PushConfig;
use crate::dispatch::formats::PushPayload;
use crate::dispatch::DeliveryResult;
use crate::engine::ports::{PushSubscription, PushSubscriptionStore};

/// Seconds the push service may hold an undelivered notification
const PUSH_TTL_SECS: u32 = 3600;

/// Web Push notification client
#[derive(Clone)]
pub struct PushNotifier {
    client: Client,
    config: PushConfig,
    subscriptions: Arc<dyn PushSubscriptionStore>,
}

impl PushNotifier {
    pub fn new(config: PushConfig, subscriptions: Arc<dyn PushSubscriptionStore>) -> Self {
        Self {
            client: Client::new(),
            config,
            subscriptions,
        }
    }

    /// Deliver `payload` to every active subscription of every target
    /// user. One aggregate result for the push channel.
    pub async fn send(&self, user_ids: &[Uuid], payload: &PushPayload) -> DeliveryResult {
        if !self.config.is_configured() {
            info!(
                users = user_ids.len(),
                title = %payload.title,
                "VAPID keys not configured, push delivery mocked"
            );
            return DeliveryResult::mocked("push", "VAPID keys not configured");
        }

        let mut endpoints: Vec<PushSubscription> = Vec::new();
        for user_id in user_ids {
            match self.subscriptions.active_subscriptions(*user_id).await {
                Ok(subs) => endpoints.extend(subs),
                Err(e) => {
                    warn!(%user_id, error = %e, "failed to load push subscriptions");
                }
            }
        }

        if endpoints.is_empty() {
            return DeliveryResult::mocked("push", "no active subscriptions");
        }

        let attempts = endpoints
            .iter()
            .map(|sub| self.push_to_endpoint(sub, payload));
        let outcomes = join_all(attempts).await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        let failed = outcomes.len() - delivered;
        debug!(delivered, failed, "push fan-out complete");

        if delivered > 0 {
            DeliveryResult::delivered_with_detail(
                "push",
                format!("{delivered} delivered, {failed} failed"),
            )
        } else {
            DeliveryResult::failed("push", format!("all {failed} subscriptions failed"))
        }
    }

    async fn push_to_endpoint(&self, sub: &PushSubscription, payload: &PushPayload) -> bool {
        let response = self
            .client
            .post(&sub.endpoint)
            .header("TTL", PUSH_TTL_SECS)
            .header("Urgency", payload.priority.as_str())
            .json(payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                let status = resp.status();
                warn!(endpoint = %sub.endpoint, %status, "push endpoint rejected notification");
                if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
                    if let Err(e) = self.subscriptions.deactivate(&sub.endpoint).await {
                        warn!(endpoint = %sub.endpoint, error = %e, "failed to deactivate subscription");
                    }
                }
                false
            }
            Err(e) => {
                warn!(endpoint = %sub.endpoint, error = %e, "push request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;

    struct NoSubscriptions;

    #[async_trait]
    impl PushSubscriptionStore for NoSubscriptions {
        async fn active_subscriptions(&self, _user_id: Uuid) -> Result<Vec<PushSubscription>> {
            Ok(vec![])
        }

        async fn deactivate(&self, _endpoint: &str) -> Result<()> {
            Ok(())
        }
    }

    fn payload() -> PushPayload {
        PushPayload {
            title: "Cebu".to_string(),
            body: "msg".to_string(),
            icon: String::new(),
            badge: String::new(),
            tag: "performance-alert".to_string(),
            priority: "normal".to_string(),
            data: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn missing_vapid_keys_mock_delivery() {
        let notifier = PushNotifier::new(PushConfig::default(), Arc::new(NoSubscriptions));
        let result = notifier.send(&[Uuid::new_v4()], &payload()).await;
        assert!(result.success);
        assert!(result.mocked);
    }

    #[tokio::test]
    async fn no_subscriptions_is_a_mocked_delivery_not_an_error() {
        let config = PushConfig {
            vapid_public_key: Some("pk".to_string()),
            vapid_private_key: Some("sk".to_string()),
            ..Default::default()
        };
        let notifier = PushNotifier::new(config, Arc::new(NoSubscriptions));
        let result = notifier.send(&[Uuid::new_v4()], &payload()).await;
        assert!(result.success);
        assert!(result.mocked);
    }
}
