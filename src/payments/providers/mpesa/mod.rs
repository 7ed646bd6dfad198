//! Safaricom Daraja integration: OAuth token acquisition and C2B URL registration.

pub mod registrar;
pub mod token;

pub use registrar::{RegistrationState, UrlRegistrar};
pub use token::MpesaTokenProvider;

use crate::config::MpesaSettings;
use std::time::Duration;

pub const TOKEN_PATH: &str = "/oauth/v2/generate?grant_type=client_credentials";
pub const REGISTER_URL_PATH: &str = "/mpesa/c2b/v2/registerurl";

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub shortcode: Option<String>,
    pub confirmation_url: Option<String>,
    pub validation_url: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl MpesaConfig {
    pub fn from_settings(settings: &MpesaSettings) -> Self {
        Self {
            consumer_key: settings.consumer_key.clone(),
            consumer_secret: settings.consumer_secret.clone(),
            shortcode: settings.shortcode.clone(),
            confirmation_url: settings.confirmation_url.clone(),
            validation_url: settings.validation_url.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.request_timeout),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.consumer_key.is_some() && self.consumer_secret.is_some()
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}{}", self.base_url, TOKEN_PATH)
    }

    pub fn register_url_endpoint(&self) -> String {
        format!("{}{}", self.base_url, REGISTER_URL_PATH)
    }
}
