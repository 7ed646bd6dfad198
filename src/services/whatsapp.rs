//! WhatsApp Cloud API text messages

use crate::logging::mask_phone;
use crate::services::notification::{http_client, FeedbackNotifier, NotificationError};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub struct WhatsAppCloudNotifier {
    client: reqwest::Client,
    api_url: String,
    phone_number_id: String,
    token: Option<String>,
}

impl WhatsAppCloudNotifier {
    pub fn new(
        api_url: impl Into<String>,
        phone_number_id: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.into(),
            token,
        })
    }

    fn messages_endpoint(&self) -> String {
        format!("{}/{}/messages", self.api_url, self.phone_number_id)
    }
}

#[async_trait]
impl FeedbackNotifier for WhatsAppCloudNotifier {
    fn channel(&self) -> &'static str {
        "whatsapp"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| NotificationError::NotConfigured("WHATSAPP_API_TOKEN".to_string()))?;

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        let response = self
            .client
            .post(self.messages_endpoint())
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                phone = %mask_phone(to),
                status = status.as_u16(),
                "WhatsApp rejected message"
            );
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(phone = %mask_phone(to), "WhatsApp message accepted");
        Ok(())
    }
}
