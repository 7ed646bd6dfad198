use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    /// A required credential or setting is absent
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// The OAuth token call failed at the transport level or was rejected
    #[error("Authentication failed: {message}")]
    AuthenticationError {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// The provider answered with JSON we could not use
    #[error("Unexpected provider response: {message}")]
    ResponseFormatError { message: String },

    /// URL registration was refused or could not be delivered
    #[error("URL registration failed: {message}")]
    RegistrationError {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },
}

impl PaymentError {
    pub fn configuration(message: impl Into<String>) -> Self {
        PaymentError::ConfigurationError {
            message: message.into(),
        }
    }

    /// HTTP status the provider answered with, when there was one
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            PaymentError::AuthenticationError { status, .. }
            | PaymentError::RegistrationError { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw provider body attached to the failure, for logging
    pub fn provider_body(&self) -> Option<&str> {
        match self {
            PaymentError::AuthenticationError { body, .. }
            | PaymentError::RegistrationError { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}
