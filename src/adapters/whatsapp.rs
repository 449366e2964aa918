//! WhatsApp notifications via Twilio.
//!
//! Delivery is a stub: with credentials present the message is queued
//! (logged) and reported successful; without them it is mocked. The full
//! Twilio round trip lives outside this service.

use tracing::info;

use crate::config::WhatsAppConfig;
use crate::dispatch::{DeliveryResult, NotificationMeta};

#[derive(Clone)]
pub struct WhatsAppNotifier {
    config: WhatsAppConfig,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self { config }
    }

    pub async fn send(&self, message: &str, meta: &NotificationMeta) -> DeliveryResult {
        if !self.config.is_configured() {
            info!(
                center = %meta.center_name,
                body = message,
                "Twilio WhatsApp credentials not configured, delivery mocked"
            );
            return DeliveryResult::mocked("whatsapp", "Twilio credentials not configured");
        }

        info!(
            center = %meta.center_name,
            from = self.config.from_number.as_deref().unwrap_or_default(),
            "WhatsApp message queued"
        );
        DeliveryResult::delivered_with_detail("whatsapp", "queued")
    }
}
