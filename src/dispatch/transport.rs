//! Transport seam between the dispatcher and concrete channel adapters.
//! Tests substitute a recording fake; production wires the adapters.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::{EmailNotifier, PushNotifier, SlackNotifier, WhatsAppNotifier};
use crate::dispatch::formats::PushPayload;
use crate::dispatch::{DeliveryResult, NotificationMeta, SlackChannel};

/// One method per supported channel. Implementations must return a
/// result value, never propagate an error past the dispatcher.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn slack(
        &self,
        channel: SlackChannel,
        message: &str,
        meta: &NotificationMeta,
    ) -> DeliveryResult;

    async fn email(&self, recipients: &[String], subject: &str, html: &str) -> DeliveryResult;

    async fn web_push(&self, user_ids: &[Uuid], payload: &PushPayload) -> DeliveryResult;

    async fn whatsapp(&self, message: &str, meta: &NotificationMeta) -> DeliveryResult;
}

/// Production transport: each channel backed by its adapter, each adapter
/// responsible for its own mocked fallback when unconfigured.
pub struct ChannelTransport {
    slack: SlackNotifier,
    email: EmailNotifier,
    push: PushNotifier,
    whatsapp: WhatsAppNotifier,
}

impl ChannelTransport {
    pub fn new(
        slack: SlackNotifier,
        email: EmailNotifier,
        push: PushNotifier,
        whatsapp: WhatsAppNotifier,
    ) -> Arc<Self> {
        Arc::new(Self {
            slack,
            email,
            push,
            whatsapp,
        })
    }
}

#[async_trait]
impl NotificationTransport for ChannelTransport {
    async fn slack(
        &self,
        channel: SlackChannel,
        message: &str,
        meta: &NotificationMeta,
    ) -> DeliveryResult {
        self.slack.send(channel, message, meta).await
    }

    async fn email(&self, recipients: &[String], subject: &str, html: &str) -> DeliveryResult {
        self.email.send(recipients, subject, html).await
    }

    async fn web_push(&self, user_ids: &[Uuid], payload: &PushPayload) -> DeliveryResult {
        self.push.send(user_ids, payload).await
    }

    async fn whatsapp(&self, message: &str, meta: &NotificationMeta) -> DeliveryResult {
        self.whatsapp.send(message, meta).await
    }
}
