//! C2B confirmation handling: record the payer, then ask them for feedback.

use crate::database::customer_repository::{Customer, NewCustomer};
use crate::database::store::DataStore;
use crate::error::{AppError, AppResult};
use crate::logging::{mask_phone, phone_fingerprint};
use crate::payments::types::PaymentConfirmation;
use crate::services::notification::FeedbackNotifier;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened while processing one confirmation
#[derive(Debug, Clone)]
pub struct ConfirmationReceipt {
    pub customer: Customer,
    pub customer_created: bool,
    pub notification_sent: bool,
}

pub struct PaymentConfirmationService {
    store: Arc<dyn DataStore>,
    notifier: Arc<dyn FeedbackNotifier>,
}

impl PaymentConfirmationService {
    pub fn new(store: Arc<dyn DataStore>, notifier: Arc<dyn FeedbackNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn confirm(&self, confirmation: &PaymentConfirmation) -> AppResult<ConfirmationReceipt> {
        let payer = confirmation
            .payer()
            .map_err(|missing| AppError::missing_field(missing.field_name()))?;

        info!(
            trans_id = %payer.transaction_id,
            phone = %mask_phone(&payer.phone),
            phone_fp = %phone_fingerprint(&payer.phone),
            amount = %confirmation.trans_amount,
            "Payment confirmation received"
        );

        let (customer, customer_created) = self
            .store
            .get_or_create_customer(NewCustomer {
                first_name: payer.first_name.clone(),
                second_name: payer.second_name,
                last_name: payer.last_name,
                phone: payer.phone.clone(),
            })
            .await
            .map_err(|e| AppError::from(e).with_context("Failed to store customer data"))?;

        if customer_created {
            info!(customer_id = customer.id, "New customer recorded");
        }

        let notification_sent = match self
            .notifier
            .send_feedback_request(&customer.phone, &customer.first_name)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    channel = self.notifier.channel(),
                    phone = %mask_phone(&customer.phone),
                    error = %e,
                    "Feedback request not delivered"
                );
                false
            }
        };

        Ok(ConfirmationReceipt {
            customer,
            customer_created,
            notification_sent,
        })
    }
}
