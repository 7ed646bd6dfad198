use super::MpesaConfig;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::AccessTokenProvider;
use crate::payments::types::{AccessToken, TokenResponse};
use crate::payments::utils::{basic_credentials, Authorization, ProviderHttpClient};
use async_trait::async_trait;
use tracing::{debug, error, info};

/// Exchanges the consumer key/secret for a bearer token. Each call is a
/// fresh round trip.
pub struct MpesaTokenProvider {
    config: MpesaConfig,
    http: ProviderHttpClient,
}

impl MpesaTokenProvider {
    pub fn new(config: MpesaConfig) -> PaymentResult<Self> {
        let http = ProviderHttpClient::new(config.timeout)?;
        Ok(Self { config, http })
    }

    fn credentials(&self) -> PaymentResult<String> {
        match (&self.config.consumer_key, &self.config.consumer_secret) {
            (Some(key), Some(secret)) => Ok(basic_credentials(key, secret)),
            _ => {
                error!("M-Pesa credentials not found in configuration");
                Err(PaymentError::configuration(
                    "MPESA_CONSUMER_KEY and MPESA_CONSUMER_SECRET are required",
                ))
            }
        }
    }
}

#[async_trait]
impl AccessTokenProvider for MpesaTokenProvider {
    async fn access_token(&self) -> PaymentResult<AccessToken> {
        let credentials = self.credentials()?;

        let response = self
            .http
            .send(
                reqwest::Method::GET,
                &self.config.token_endpoint(),
                Authorization::Basic(&credentials),
                None,
            )
            .await
            .map_err(|e| {
                error!(error = %e, "M-Pesa authentication request failed");
                PaymentError::AuthenticationError {
                    message: e.message.clone(),
                    status: e.status,
                    body: e.body.clone(),
                }
            })?;

        debug!(status = response.status, "M-Pesa token endpoint responded");

        if !response.is_success() {
            error!(
                status = response.status,
                body = %response.body,
                "M-Pesa token request rejected"
            );
            return Err(PaymentError::AuthenticationError {
                message: format!("token endpoint returned HTTP {}", response.status),
                status: Some(response.status),
                body: Some(response.body),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            PaymentError::ResponseFormatError {
                message: format!("token response is not valid JSON: {}", e),
            }
        })?;

        let expires_in = parsed.expires_in_secs();
        match parsed.access_token {
            Some(token) if !token.is_empty() => {
                info!(expires_in = ?expires_in, "Obtained M-Pesa access token");
                Ok(AccessToken::new(token, expires_in))
            }
            _ => {
                error!(body = %response.body, "No access token in M-Pesa response");
                Err(PaymentError::ResponseFormatError {
                    message: "token response has no access_token field".to_string(),
                })
            }
        }
    }
}
