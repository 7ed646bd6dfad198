use crate::payments::error::{PaymentError, PaymentResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

/// Status and body of a provider response, whatever the status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a readable response. When the status line
/// arrived before the failure it is kept, along with any body we could read.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<String>,
}

pub enum Authorization<'a> {
    Basic(&'a str),
    Bearer(&'a str),
}

/// Thin reqwest wrapper with a bounded timeout. It performs exactly one
/// attempt per call; retry policy belongs to the caller.
#[derive(Clone)]
pub struct ProviderHttpClient {
    client: Client,
    timeout: Duration,
}

impl ProviderHttpClient {
    pub fn new(timeout: Duration) -> PaymentResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            PaymentError::configuration(format!("failed to initialize HTTP client: {}", e))
        })?;

        Ok(Self { client, timeout })
    }

    pub async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        authorization: Authorization<'_>,
        body: Option<&JsonValue>,
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.client.request(method, url).timeout(self.timeout);

        request = match authorization {
            Authorization::Basic(credentials) => {
                request.header("Authorization", format!("Basic {}", credentials))
            }
            Authorization::Bearer(token) => request.bearer_auth(token),
        };
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| TransportError {
            message: format!("provider request failed: {}", e),
            status: e.status().map(|s| s.as_u16()),
            body: None,
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError {
            message: format!("failed to read provider response: {}", e),
            status: Some(status),
            body: None,
        })?;

        Ok(RawResponse { status, body })
    }
}

/// Base64 of `key:secret` for HTTP Basic authentication
pub fn basic_credentials(key: &str, secret: &str) -> String {
    STANDARD.encode(format!("{}:{}", key, secret))
}

/// Strip whitespace and trailing `;`/`,` left behind by hand-edited
/// environment files. Empty results count as absent.
pub fn normalize_callback_url(raw: Option<&str>) -> Option<String> {
    raw.map(|url| url.trim().trim_end_matches([';', ',']).trim_end().to_string())
        .filter(|url| !url.is_empty())
}
