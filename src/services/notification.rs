//! Outbound feedback requests to payers.
//!
//! Delivery is best effort: callers log a failed send and move on.

use crate::config::{MessagingConfig, MessagingProvider};
use crate::services::twilio::TwilioNotifier;
use crate::services::whatsapp::WhatsAppCloudNotifier;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    #[error("messaging provider is not configured: {0}")]
    NotConfigured(String),

    #[error("messaging transport failed: {0}")]
    Transport(String),

    #[error("messaging provider rejected the message with status {status}")]
    Rejected { status: u16, body: String },
}

/// Text of the message asking a payer to rate the business
pub fn feedback_request_message(first_name: &str) -> String {
    format!(
        "Hi {}, thank you for your payment! Could you please rate our service on a scale of 1 to 5? \
         Also, let us know if you're comfortable providing additional feedback about our business.",
        first_name
    )
}

#[async_trait]
pub trait FeedbackNotifier: Send + Sync {
    /// Short name used in logs
    fn channel(&self) -> &'static str;

    async fn send_text(&self, to: &str, body: &str) -> Result<(), NotificationError>;

    async fn send_feedback_request(
        &self,
        phone: &str,
        first_name: &str,
    ) -> Result<(), NotificationError> {
        self.send_text(phone, &feedback_request_message(first_name))
            .await
    }
}

/// Drops every message. Used when MESSAGING_PROVIDER=disabled.
pub struct DisabledNotifier;

#[async_trait]
impl FeedbackNotifier for DisabledNotifier {
    fn channel(&self) -> &'static str {
        "disabled"
    }

    async fn send_text(&self, _to: &str, _body: &str) -> Result<(), NotificationError> {
        Ok(())
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, NotificationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NotificationError::Transport(e.to_string()))
}

/// Build the notifier selected by configuration
pub fn build_notifier(
    config: &MessagingConfig,
) -> Result<Arc<dyn FeedbackNotifier>, NotificationError> {
    let timeout = Duration::from_secs(config.timeout);

    let notifier: Arc<dyn FeedbackNotifier> = match config.provider {
        MessagingProvider::WhatsApp => Arc::new(WhatsAppCloudNotifier::new(
            config.whatsapp_api_url.clone(),
            config.whatsapp_phone_number_id.clone(),
            config.whatsapp_token.clone(),
            timeout,
        )?),
        MessagingProvider::Twilio => Arc::new(TwilioNotifier::new(
            config.twilio_api_url.clone(),
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.twilio_whatsapp_number.clone(),
            timeout,
        )?),
        MessagingProvider::Disabled => Arc::new(DisabledNotifier),
    };

    info!(channel = notifier.channel(), "Feedback notifier ready");
    Ok(notifier)
}
