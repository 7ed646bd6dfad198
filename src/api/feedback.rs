use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value as JsonValue};

use super::{rejection_error, AppState};
use crate::error::AppError;
use crate::middleware::error::get_request_id_from_headers;
use crate::services::feedback::FeedbackSubmission;

/// POST /store-feedback
pub async fn store_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let request_id = get_request_id_from_headers(&headers);

    let Json(submission) =
        payload.map_err(|r| rejection_error(r).with_optional_request_id(request_id.clone()))?;

    state
        .feedback
        .submit(submission)
        .await
        .map_err(|e| e.with_optional_request_id(request_id))?;

    Ok(Json(json!({ "status": "Feedback stored successfully." })))
}

/// GET /check-database
pub async fn check_database(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, AppError> {
    let records = state
        .feedback
        .snapshot()
        .await
        .map_err(|e| e.with_optional_request_id(get_request_id_from_headers(&headers)))?;

    Ok(Json(json!({ "data": records })))
}
