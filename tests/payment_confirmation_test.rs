//! Receipts returned by the confirmation service

mod common;

use common::{InMemoryStore, RecordingNotifier};
use mpesa_feedback::payments::types::PaymentConfirmation;
use mpesa_feedback::services::PaymentConfirmationService;
use std::sync::Arc;

fn confirmation(phone: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        trans_id: "RKTQDM7W6S".to_string(),
        trans_amount: "150.00".to_string(),
        msisdn: Some(phone.to_string()),
        first_name: Some("Jane".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn receipt_reports_new_then_returning_customer() {
    let store = Arc::new(InMemoryStore::new());
    let service = PaymentConfirmationService::new(store, Arc::new(RecordingNotifier::new()));

    let first = service.confirm(&confirmation("254712345678")).await.unwrap();
    assert!(first.customer_created);
    assert!(first.notification_sent);

    let second = service.confirm(&confirmation("254712345678")).await.unwrap();
    assert!(!second.customer_created);
    assert_eq!(second.customer.id, first.customer.id);
}

#[tokio::test]
async fn receipt_reports_undelivered_notification() {
    let service = PaymentConfirmationService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(RecordingNotifier::failing()),
    );

    let receipt = service.confirm(&confirmation("254712345678")).await.unwrap();
    assert!(receipt.customer_created);
    assert!(!receipt.notification_sent);
}
