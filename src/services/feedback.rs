//! Feedback submission and the customer/feedback dump.

use crate::database::feedback_repository::NewFeedback;
use crate::database::store::{CustomerWithFeedback, DataStore};
use crate::error::{AppError, AppResult};
use crate::logging::mask_phone;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackSubmission {
    #[serde(default)]
    pub phone: String,
    pub rating: i32,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeedbackEntry {
    pub feedback_id: i64,
    pub rating: Option<i32>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CustomerRecord {
    pub customer_id: i64,
    pub first_name: String,
    pub second_name: String,
    pub last_name: String,
    pub phone: String,
    pub feedback: Vec<FeedbackEntry>,
}

impl From<CustomerWithFeedback> for CustomerRecord {
    fn from(row: CustomerWithFeedback) -> Self {
        let CustomerWithFeedback { customer, feedback } = row;
        Self {
            customer_id: customer.id,
            first_name: customer.first_name,
            second_name: customer.second_name,
            last_name: customer.last_name,
            phone: customer.phone,
            feedback: feedback
                .into_iter()
                .map(|f| FeedbackEntry {
                    feedback_id: f.id,
                    rating: f.rating,
                    comments: f.comments,
                })
                .collect(),
        }
    }
}

pub struct FeedbackService {
    store: Arc<dyn DataStore>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Store feedback for an existing customer; returns the new feedback id
    pub async fn submit(&self, submission: FeedbackSubmission) -> AppResult<i64> {
        let phone = submission.phone.trim();
        if phone.is_empty() {
            return Err(AppError::missing_field("phone"));
        }

        if !(MIN_RATING..=MAX_RATING).contains(&submission.rating) {
            return Err(AppError::out_of_range(
                "rating",
                MIN_RATING.into(),
                MAX_RATING.into(),
            ));
        }

        let customer = self
            .store
            .find_customer_by_phone(phone)
            .await
            .map_err(|e| AppError::from(e).with_context("Failed to store feedback"))?
            .ok_or_else(|| AppError::customer_not_found(phone))?;

        let comments = submission
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let feedback = self
            .store
            .create_feedback(NewFeedback {
                customer_id: customer.id,
                rating: submission.rating,
                comments,
            })
            .await
            .map_err(|e| AppError::from(e).with_context("Failed to store feedback"))?;

        info!(
            customer_id = customer.id,
            feedback_id = feedback.id,
            phone = %mask_phone(phone),
            rating = submission.rating,
            "Feedback stored"
        );

        Ok(feedback.id)
    }

    /// Every customer with their feedback, by customer id then feedback id
    pub async fn snapshot(&self) -> AppResult<Vec<CustomerRecord>> {
        let rows = self
            .store
            .list_customers_with_feedback()
            .await
            .map_err(|e| AppError::from(e).with_context("Failed to retrieve database records"))?;

        Ok(rows.into_iter().map(CustomerRecord::from).collect())
    }
}
