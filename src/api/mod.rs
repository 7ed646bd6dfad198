//! HTTP surface: routes, shared state and the middleware stack

pub mod feedback;
pub mod payments;
pub mod system;

use crate::database::DataStore;
use crate::error::{AppError, AppErrorKind, ValidationError};
use crate::health::HealthChecker;
use crate::middleware::error::panic_response;
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::services::{FeedbackNotifier, FeedbackService, PaymentConfirmationService};
use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub confirmations: Arc<PaymentConfirmationService>,
    pub feedback: Arc<FeedbackService>,
    pub health_checker: HealthChecker,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, notifier: Arc<dyn FeedbackNotifier>) -> Self {
        Self {
            confirmations: Arc::new(PaymentConfirmationService::new(store.clone(), notifier)),
            feedback: Arc::new(FeedbackService::new(store.clone())),
            health_checker: HealthChecker::new(store),
        }
    }
}

/// Body extraction failures are the caller's fault
pub(crate) fn rejection_error(rejection: JsonRejection) -> AppError {
    AppError::new(AppErrorKind::Validation(ValidationError::MalformedPayload {
        reason: rejection.body_text(),
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/payments-confirmation", post(payments::confirm_payment))
        .route("/store-feedback", post(feedback::store_feedback))
        .route("/check-database", get(feedback::check_database))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::custom(panic_response)),
        )
}
