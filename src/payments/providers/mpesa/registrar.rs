//! Idempotent C2B URL registration.
//!
//! One registration run is a small state machine:
//!
//! ```text
//!   Sending(Initial) --200--------------------------> Succeeded(Registered)
//!   Sending(*)       --"already registered" body----> Succeeded(AlreadyRegistered)
//!   Sending(Initial) --401--------------------------> AwaitingRetry
//!   AwaitingRetry    --fresh token------------------> Sending(Retry)
//!   Sending(*)       --anything else----------------> Failed(RegistrationError)
//! ```
//!
//! The "already registered" check applies to every response body we get to
//! see, including bodies attached to transport failures.

use super::MpesaConfig;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::AccessTokenProvider;
use crate::payments::types::{already_registered_body, RegisterUrlRequest, RegistrationOutcome};
use crate::payments::utils::{
    normalize_callback_url, Authorization, ProviderHttpClient, RawResponse, TransportError,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Retry,
}

#[derive(Debug)]
pub enum RegistrationState {
    Sending(Attempt),
    AwaitingRetry,
    Succeeded(RegistrationOutcome),
    Failed(PaymentError),
}

impl RegistrationState {
    /// The transition table: where one POST attempt leads.
    pub fn after_attempt(attempt: Attempt, result: Result<RawResponse, TransportError>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(failure) => {
                if let Some(response_data) = failure.body.as_deref().and_then(already_registered_body)
                {
                    return RegistrationState::Succeeded(RegistrationOutcome::AlreadyRegistered {
                        response_data,
                    });
                }
                return RegistrationState::Failed(PaymentError::RegistrationError {
                    message: failure.message,
                    status: failure.status,
                    body: failure.body,
                });
            }
        };

        if response.status == 200 {
            return match serde_json::from_str::<JsonValue>(&response.body) {
                Ok(body) => RegistrationState::Succeeded(RegistrationOutcome::Registered(body)),
                Err(e) => RegistrationState::Failed(PaymentError::ResponseFormatError {
                    message: format!("registration response is not valid JSON: {}", e),
                }),
            };
        }

        if let Some(response_data) = already_registered_body(&response.body) {
            return RegistrationState::Succeeded(RegistrationOutcome::AlreadyRegistered {
                response_data,
            });
        }

        match (attempt, response.status) {
            (Attempt::Initial, 401) => RegistrationState::AwaitingRetry,
            (attempt, status) => RegistrationState::Failed(PaymentError::RegistrationError {
                message: match attempt {
                    Attempt::Initial => format!("HTTP {}", status),
                    Attempt::Retry => format!("HTTP {} after token refresh", status),
                },
                status: Some(status),
                body: Some(response.body),
            }),
        }
    }
}

pub struct UrlRegistrar {
    config: MpesaConfig,
    tokens: Arc<dyn AccessTokenProvider>,
    http: ProviderHttpClient,
}

impl UrlRegistrar {
    pub fn new(config: MpesaConfig, tokens: Arc<dyn AccessTokenProvider>) -> PaymentResult<Self> {
        let http = ProviderHttpClient::new(config.timeout)?;
        Ok(Self {
            config,
            tokens,
            http,
        })
    }

    /// Build the registration body from configuration, normalizing both URLs
    pub fn registration_request(&self) -> PaymentResult<RegisterUrlRequest> {
        let shortcode = self
            .config
            .shortcode
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let confirmation_url = normalize_callback_url(self.config.confirmation_url.as_deref());
        let validation_url = normalize_callback_url(self.config.validation_url.as_deref());

        match (shortcode, confirmation_url, validation_url) {
            (Some(shortcode), Some(confirmation_url), Some(validation_url)) => {
                Ok(RegisterUrlRequest {
                    short_code: shortcode.to_string(),
                    response_type: "Completed".to_string(),
                    confirmation_url,
                    validation_url,
                })
            }
            _ => {
                error!("M-Pesa shortcode, confirmation URL, or validation URL not configured");
                Err(PaymentError::configuration(
                    "MPESA_SHORTCODE, CONFIRMATION_URL and VALIDATION_URL are required",
                ))
            }
        }
    }

    pub async fn register(&self) -> PaymentResult<RegistrationOutcome> {
        let request = self.registration_request()?;
        let payload = serde_json::to_value(&request).map_err(|e| {
            PaymentError::configuration(format!("failed to encode registration request: {}", e))
        })?;
        let endpoint = self.config.register_url_endpoint();

        let mut token = self.tokens.access_token().await?;
        let mut state = RegistrationState::Sending(Attempt::Initial);

        loop {
            state = match state {
                RegistrationState::Sending(attempt) => {
                    let result = self
                        .http
                        .send(
                            reqwest::Method::POST,
                            &endpoint,
                            Authorization::Bearer(token.secret()),
                            Some(&payload),
                        )
                        .await;
                    match &result {
                        Ok(response) => info!(
                            attempt = ?attempt,
                            status = response.status,
                            body = %response.body,
                            "Register URL response"
                        ),
                        Err(e) => warn!(attempt = ?attempt, error = %e, "Register URL request failed"),
                    }
                    RegistrationState::after_attempt(attempt, result)
                }
                RegistrationState::AwaitingRetry => {
                    warn!("Register URL rejected token, retrying with a fresh one");
                    token = self.tokens.access_token().await.map_err(|e| {
                        PaymentError::RegistrationError {
                            message: format!("token refresh after 401 failed: {}", e),
                            status: e.provider_status(),
                            body: e.provider_body().map(str::to_string),
                        }
                    })?;
                    RegistrationState::Sending(Attempt::Retry)
                }
                RegistrationState::Succeeded(outcome) => {
                    if outcome.is_already_registered() {
                        info!("URLs are already registered, nothing to do");
                    } else {
                        info!(shortcode = %request.short_code, "C2B URLs registered");
                    }
                    return Ok(outcome);
                }
                RegistrationState::Failed(err) => {
                    error!(
                        error = %err,
                        status = ?err.provider_status(),
                        body = ?err.provider_body(),
                        "URL registration failed"
                    );
                    return Err(err);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::types::AccessToken;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALREADY: &str =
        r#"{"requestId":"11728-2929992-1","errorCode":"500.003.1001","errorMessage":"URLs are already registered"}"#;

    fn response(status: u16, body: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn ok_response_succeeds_with_body() {
        let state = RegistrationState::after_attempt(
            Attempt::Initial,
            response(200, r#"{"ResponseDescription":"success"}"#),
        );
        match state {
            RegistrationState::Succeeded(RegistrationOutcome::Registered(body)) => {
                assert_eq!(body["ResponseDescription"], "success")
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn ok_response_with_garbage_is_a_format_error() {
        let state = RegistrationState::after_attempt(Attempt::Initial, response(200, "<html>"));
        assert!(matches!(
            state,
            RegistrationState::Failed(PaymentError::ResponseFormatError { .. })
        ));
    }

    #[test]
    fn already_registered_wins_on_any_attempt() {
        for attempt in [Attempt::Initial, Attempt::Retry] {
            let state = RegistrationState::after_attempt(attempt, response(500, ALREADY));
            assert!(matches!(
                state,
                RegistrationState::Succeeded(RegistrationOutcome::AlreadyRegistered { .. })
            ));
        }
    }

    #[test]
    fn already_registered_inside_transport_failure() {
        let state = RegistrationState::after_attempt(
            Attempt::Initial,
            Err(TransportError {
                message: "HTTP status server error (500)".to_string(),
                status: Some(500),
                body: Some(ALREADY.to_string()),
            }),
        );
        assert!(matches!(
            state,
            RegistrationState::Succeeded(RegistrationOutcome::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn first_unauthorized_waits_for_retry_second_fails() {
        let first = RegistrationState::after_attempt(Attempt::Initial, response(401, "{}"));
        assert!(matches!(first, RegistrationState::AwaitingRetry));

        let second = RegistrationState::after_attempt(Attempt::Retry, response(401, "{}"));
        match second {
            RegistrationState::Failed(err) => {
                assert!(matches!(err, PaymentError::RegistrationError { .. }));
                assert_eq!(err.provider_status(), Some(401));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn other_statuses_fail_with_status_and_body() {
        let state = RegistrationState::after_attempt(
            Attempt::Initial,
            response(400, r#"{"errorCode":"400.002.02","errorMessage":"Bad Request - Invalid ShortCode"}"#),
        );
        match state {
            RegistrationState::Failed(err) => {
                assert_eq!(err.provider_status(), Some(400));
                assert!(err.provider_body().unwrap().contains("Invalid ShortCode"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn transport_failure_without_body_fails() {
        let state = RegistrationState::after_attempt(
            Attempt::Initial,
            Err(TransportError {
                message: "connection refused".to_string(),
                status: None,
                body: None,
            }),
        );
        assert!(matches!(
            state,
            RegistrationState::Failed(PaymentError::RegistrationError { status: None, .. })
        ));
    }

    /// Hands out "token-1", "token-2", ... and counts calls
    struct CountingTokens {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AccessTokenProvider for CountingTokens {
        async fn access_token(&self) -> PaymentResult<AccessToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AccessToken::new(format!("token-{}", n), Some(3599)))
        }
    }

    fn config(base_url: &str, confirmation_url: &str) -> MpesaConfig {
        MpesaConfig {
            consumer_key: Some("key".to_string()),
            consumer_secret: Some("secret".to_string()),
            shortcode: Some("600000".to_string()),
            confirmation_url: Some(confirmation_url.to_string()),
            validation_url: Some("https://shop.example.com/validate,".to_string()),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn retry_uses_a_fresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mpesa/c2b/v2/registerurl"))
            .and(header("Authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"errorCode":"404.001.03"}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/mpesa/c2b/v2/registerurl"))
            .and(header("Authorization", "Bearer token-2"))
            .and(body_json(json!({
                "ShortCode": "600000",
                "ResponseType": "Completed",
                "ConfirmationURL": "https://shop.example.com/payments-confirmation",
                "ValidationURL": "https://shop.example.com/validate"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "OriginatorCoversationID": "7619-37765134-1",
                "ResponseCode": "0",
                "ResponseDescription": "success"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Arc::new(CountingTokens {
            calls: AtomicUsize::new(0),
        });
        let registrar = UrlRegistrar::new(
            config(&server.uri(), "https://shop.example.com/payments-confirmation;"),
            tokens.clone(),
        )
        .unwrap();

        let outcome = registrar.register().await.unwrap();
        assert_eq!(tokens.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            outcome,
            RegistrationOutcome::Registered(json!({
                "OriginatorCoversationID": "7619-37765134-1",
                "ResponseCode": "0",
                "ResponseDescription": "success"
            }))
        );
    }

    #[tokio::test]
    async fn missing_shortcode_fails_before_any_token_request() {
        let tokens = Arc::new(CountingTokens {
            calls: AtomicUsize::new(0),
        });
        let mut cfg = config("http://127.0.0.1:1", "https://shop.example.com/confirm");
        cfg.shortcode = None;
        let registrar = UrlRegistrar::new(cfg, tokens.clone()).unwrap();

        let err = registrar.register().await.unwrap_err();
        assert!(matches!(err, PaymentError::ConfigurationError { .. }));
        assert_eq!(tokens.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn registration_request_rejects_separator_only_url() {
        let tokens = Arc::new(CountingTokens {
            calls: AtomicUsize::new(0),
        });
        let registrar = UrlRegistrar::new(config("http://127.0.0.1:1", ";"), tokens).unwrap();
        assert!(matches!(
            registrar.registration_request(),
            Err(PaymentError::ConfigurationError { .. })
        ));
    }
}
