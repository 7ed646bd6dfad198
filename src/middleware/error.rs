//! JSON error bodies
//!
//! Every failed request answers with the same envelope:
//! `{error, message, request_id, timestamp, details?, retryable?}`.

use crate::error::{AppError, AppErrorKind, ErrorCode, ValidationError};
use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorCode,
    pub message: String,
    pub request_id: Option<String>,
    /// RFC 3339
    pub timestamp: String,
    /// Offending field for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

fn validation_details(error: &AppError) -> Option<serde_json::Value> {
    match &error.kind {
        AppErrorKind::Validation(ValidationError::MissingField { field }) => {
            Some(json!({ "field": field }))
        }
        AppErrorKind::Validation(ValidationError::OutOfRange { field, min, max }) => {
            Some(json!({ "field": field, "min": min, "max": max }))
        }
        _ => None,
    }
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            error: error.error_code(),
            message: error.user_message(),
            request_id: error.request_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            details: validation_details(error),
            retryable: Some(error.is_retryable()),
        }
    }

    pub fn internal_error(request_id: Option<String>) -> Self {
        Self {
            error: ErrorCode::InternalError,
            message: "An internal server error occurred. Please try again later.".to_string(),
            request_id,
            timestamp: Utc::now().to_rfc3339(),
            details: None,
            retryable: Some(false),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self.kind {
            AppErrorKind::Infrastructure(cause) => tracing::error!(
                cause = ?cause,
                context = ?self.context,
                request_id = ?self.request_id,
                status = status.as_u16(),
                "Request failed on infrastructure"
            ),
            _ => tracing::warn!(
                error = %self,
                request_id = ?self.request_id,
                status = status.as_u16(),
                "Request rejected"
            ),
        }

        (status, Json(ErrorResponse::from_app_error(&self))).into_response()
    }
}

/// Response for `CatchPanicLayer::custom`
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    tracing::error!(panic = %detail, "Handler panicked");

    let body = serde_json::to_vec(&ErrorResponse::internal_error(None)).unwrap_or_default();
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

pub fn get_request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
