// Outbound messaging: the WhatsApp Cloud API, or a log sink when no credentials are configured.
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::NotifierSettings;
use crate::error::EngineError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), EngineError>;
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

pub struct WhatsAppNotifier {
    http: Client,
    endpoint: String,
    access_token: String,
    recipient: String,
    timeout: Duration,
}

impl WhatsAppNotifier {
    pub fn new(
        api_base: &str,
        phone_number_id: &str,
        access_token: impl Into<String>,
        recipient: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let http = Client::builder()
            .user_agent("btc-sentiment-dashboard")
            .build()
            .map_err(|e| EngineError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(WhatsAppNotifier {
            http,
            endpoint: format!("{}/{}/messages", api_base.trim_end_matches('/'), phone_number_id),
            access_token: access_token.into(),
            recipient: recipient.into(),
            timeout,
        })
    }

    // None when any credential is missing.
    pub fn from_settings(settings: &NotifierSettings) -> Result<Option<Self>, EngineError> {
        match (&settings.access_token, &settings.phone_number_id, &settings.recipient) {
            (Some(token), Some(phone_id), Some(recipient)) => Self::new(
                &settings.api_base,
                phone_id,
                token.clone(),
                recipient.clone(),
                Duration::from_secs(settings.timeout_secs),
            )
            .map(Some),
            _ => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn payload<'a>(&'a self, message: &'a str) -> TextMessage<'a> {
        TextMessage {
            messaging_product: "whatsapp",
            to: &self.recipient,
            kind: "text",
            text: TextBody { body: message },
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send(&self, message: &str) -> Result<(), EngineError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&self.payload(message))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| EngineError::NotificationSendError(format!("Request to messaging API failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::NotificationSendError(format!(
                "Messaging API returned HTTP {}: {}",
                status, body
            )));
        }
        tracing::info!(status = %status, "Digest delivered to messaging API");
        Ok(())
    }
}

// Writes the digest to the log instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), EngineError> {
        tracing::info!(message = %message, "Digest (messaging credentials not configured, logging only)");
        Ok(())
    }
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn send(&self, message: &str) -> Result<(), EngineError> {
        (**self).send(message).await
    }
}
