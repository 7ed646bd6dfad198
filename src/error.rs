//! Application errors and their HTTP mapping.
//!
//! Handlers return [`AppError`]; `middleware::error` turns it into the JSON
//! envelope. Database detail stays in logs, callers only see `context`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable code sent in the `error` field of every error body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    CustomerNotFound,
    DatabaseError,
    InternalError,
    ValidationError,
}

#[derive(Debug, Clone)]
pub enum DomainError {
    /// Feedback arrived for a phone with no recorded payment
    CustomerNotFound { phone: String },
}

#[derive(Debug, Clone)]
pub enum InfrastructureError {
    Database { message: String, is_retryable: bool },
}

/// Problems with what the caller sent
#[derive(Debug, Clone)]
pub enum ValidationError {
    MissingField { field: String },
    MalformedPayload { reason: String },
    OutOfRange { field: String, min: i64, max: i64 },
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    Validation(ValidationError),
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    /// Caller-facing description of the failed operation
    pub context: Option<String>,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Validation(ValidationError::MissingField {
            field: field.into(),
        }))
    }

    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(AppErrorKind::Validation(ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
        }))
    }

    pub fn customer_not_found(phone: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Domain(DomainError::CustomerNotFound {
            phone: phone.into(),
        }))
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Like `with_request_id`, but keeps an existing id when given `None`
    pub fn with_optional_request_id(self, request_id: Option<String>) -> Self {
        match request_id {
            Some(id) => self.with_request_id(id),
            None => self,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Validation(_) => 400,
            AppErrorKind::Domain(DomainError::CustomerNotFound { .. }) => 404,
            AppErrorKind::Infrastructure(InfrastructureError::Database { .. }) => 500,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
            AppErrorKind::Domain(DomainError::CustomerNotFound { .. }) => {
                ErrorCode::CustomerNotFound
            }
            AppErrorKind::Infrastructure(InfrastructureError::Database { .. }) => {
                ErrorCode::DatabaseError
            }
        }
    }

    /// Message safe to show the caller
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(DomainError::CustomerNotFound { .. }) => {
                "Customer not found.".to_string()
            }
            AppErrorKind::Infrastructure(_) => self
                .context
                .clone()
                .unwrap_or_else(|| "Service temporarily unavailable. Please try again later".to_string()),
            AppErrorKind::Validation(ValidationError::MissingField { field }) => {
                format!("Required field '{}' is missing", field)
            }
            AppErrorKind::Validation(ValidationError::MalformedPayload { reason }) => {
                format!("Malformed request body: {}", reason)
            }
            AppErrorKind::Validation(ValidationError::OutOfRange { field, min, max }) => {
                format!("Field '{}' must be between {} and {}", field, min, max)
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Infrastructure(InfrastructureError::Database { is_retryable, .. }) => {
                *is_retryable
            }
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;
