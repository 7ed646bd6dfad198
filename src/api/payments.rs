use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value as JsonValue};
use tracing::info;

use super::{rejection_error, AppState};
use crate::error::AppError;
use crate::middleware::error::get_request_id_from_headers;
use crate::payments::types::PaymentConfirmation;

/// POST /payments-confirmation
pub async fn confirm_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PaymentConfirmation>, JsonRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let request_id = get_request_id_from_headers(&headers);

    let Json(confirmation) =
        payload.map_err(|r| rejection_error(r).with_optional_request_id(request_id.clone()))?;

    let receipt = state
        .confirmations
        .confirm(&confirmation)
        .await
        .map_err(|e| e.with_optional_request_id(request_id))?;

    info!(
        customer_id = receipt.customer.id,
        customer_created = receipt.customer_created,
        notification_sent = receipt.notification_sent,
        "Payment confirmation processed"
    );

    Ok(Json(json!({
        "status": "Payment confirmed and feedback request sent."
    })))
}
