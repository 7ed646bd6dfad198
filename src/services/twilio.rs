//! Twilio WhatsApp messages via the Programmable Messaging REST API

use crate::logging::mask_phone;
use crate::services::notification::{http_client, FeedbackNotifier, NotificationError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub struct TwilioNotifier {
    client: reqwest::Client,
    api_url: String,
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
}

impl TwilioNotifier {
    pub fn new(
        api_url: impl Into<String>,
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
            from_number,
        })
    }
}

fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

#[async_trait]
impl FeedbackNotifier for TwilioNotifier {
    fn channel(&self) -> &'static str {
        "twilio"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        let (sid, auth_token, from) = match (
            self.account_sid.as_deref(),
            self.auth_token.as_deref(),
            self.from_number.as_deref(),
        ) {
            (Some(sid), Some(token), Some(from)) => (sid, token, from),
            _ => {
                return Err(NotificationError::NotConfigured(
                    "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_WHATSAPP_NUMBER".to_string(),
                ))
            }
        };

        let url = format!("{}/2010-04-01/Accounts/{}/Messages.json", self.api_url, sid);
        let to_address = whatsapp_address(to);
        let from_address = whatsapp_address(from);
        let form = [
            ("To", to_address.as_str()),
            ("From", from_address.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(url)
            .basic_auth(sid, Some(auth_token))
            .form(&form[..])
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                phone = %mask_phone(to),
                status = status.as_u16(),
                "Twilio rejected message"
            );
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(phone = %mask_phone(to), "Twilio message queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn prefixes_whatsapp_scheme_once() {
        assert_eq!(whatsapp_address("+254712345678"), "whatsapp:+254712345678");
        assert_eq!(
            whatsapp_address("whatsapp:+14155238886"),
            "whatsapp:+14155238886"
        );
    }

    #[tokio::test]
    async fn posts_form_to_account_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=whatsapp%3A254712345678"))
            .and(body_string_contains("From=whatsapp%3A%2B14155238886"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TwilioNotifier::new(
            server.uri(),
            Some("AC123".to_string()),
            Some("secret".to_string()),
            Some("+14155238886".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        notifier.send_text("254712345678", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn incomplete_credentials_are_not_configured() {
        let notifier = TwilioNotifier::new(
            "http://127.0.0.1:9",
            Some("AC123".to_string()),
            None,
            Some("+14155238886".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(matches!(
            notifier.send_text("254712345678", "hello").await,
            Err(NotificationError::NotConfigured(_))
        ));
    }
}
