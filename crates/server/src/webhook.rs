use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::warn;

use yatra_core::notification::{NotificationError, NotificationMessage, NotificationTransport};

/// Posts confirmation notices as JSON to an HTTP mail relay.
pub struct WebhookTransport {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    from: &'a str,
    subject: &'a str,
    body: &'a str,
    booking_id: &'a str,
}

impl WebhookTransport {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NotificationError::Transport(error.to_string()))?;
        Ok(Self { client, url: url.into(), api_key })
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(
        &self,
        address: &str,
        message: &NotificationMessage,
    ) -> Result<(), NotificationError> {
        let payload = WebhookPayload {
            to: address,
            from: &message.from,
            subject: &message.subject,
            body: &message.body,
            booking_id: message.booking_id.as_str(),
        };

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| NotificationError::Transport(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            event_name = "notification.webhook_rejected",
            booking_id = %message.booking_id,
            status = %status,
            "notification relay rejected the request"
        );
        Err(NotificationError::Rejected { status: status.as_u16(), body })
    }
}
