//! SMTP email notifications via lettre.
//!
//! The transport is built once at startup when host + credentials are
//! present; otherwise every send is mocked.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info};

use crate::config::SmtpConfig;
use crate::dispatch::DeliveryResult;
use crate::error::Result;

/// SMTP notification client
#[derive(Clone)]
pub struct EmailNotifier {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let transport = if config.is_configured() {
            let host = config.host.as_deref().unwrap_or_default();
            let creds = Credentials::new(
                config.username.clone().unwrap_or_default(),
                config.password.clone().unwrap_or_default(),
            );
            let relay = if config.use_tls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            };
            info!(host, port = config.port, "SMTP transport configured");
            Some(relay.credentials(creds).port(config.port).build())
        } else {
            None
        };
        Ok(Self { config, transport })
    }

    fn from_address(&self) -> String {
        self.config
            .from
            .clone()
            .or_else(|| {
                self.config
                    .username
                    .as_ref()
                    .map(|user| format!("Alert Portal <{user}>"))
            })
            .unwrap_or_else(|| "Alert Portal <alerts@localhost>".to_string())
    }

    /// Send one HTML message addressed to all recipients
    pub async fn send(&self, recipients: &[String], subject: &str, html: &str) -> DeliveryResult {
        let Some(transport) = &self.transport else {
            info!(
                recipients = recipients.len(),
                subject, "SMTP not configured, delivery mocked"
            );
            return DeliveryResult::mocked("email", "SMTP not configured");
        };

        let email = match self.build_message(recipients, subject, html) {
            Ok(email) => email,
            Err(e) => {
                error!(error = %e, "failed to build email");
                return DeliveryResult::failed("email", e.to_string());
            }
        };

        match transport.send(email).await {
            Ok(response) => {
                debug!(recipients = recipients.len(), "email sent");
                DeliveryResult::delivered_with_detail(
                    "email",
                    format!("{} recipients, {}", recipients.len(), response.code()),
                )
            }
            Err(e) => {
                error!(error = %e, "email send failed");
                DeliveryResult::failed("email", e.to_string())
            }
        }
    }

    fn build_message(&self, recipients: &[String], subject: &str, html: &str) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from_address().parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        for recipient in recipients {
            builder = builder.to(recipient.parse()?);
        }
        Ok(builder.body(html.to_string())?)
    }
}
