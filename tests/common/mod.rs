#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use mpesa_feedback::database::customer_repository::{Customer, NewCustomer};
use mpesa_feedback::database::error::{DatabaseError, DatabaseErrorKind};
use mpesa_feedback::database::feedback_repository::{Feedback, NewFeedback};
use mpesa_feedback::database::store::{group_feedback, CustomerWithFeedback, DataStore};
use mpesa_feedback::services::{FeedbackNotifier, NotificationError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    customers: Vec<Customer>,
    feedback: Vec<Feedback>,
}

/// DataStore backed by vectors. `set_failing(true)` makes every call error.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.tables.lock().unwrap().customers.clone()
    }

    pub fn feedback(&self) -> Vec<Feedback> {
        self.tables.lock().unwrap().feedback.clone()
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DatabaseError::new(DatabaseErrorKind::ConnectionFailed))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, DatabaseError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.customers.iter().find(|c| c.phone == phone).cloned())
    }

    async fn get_or_create_customer(
        &self,
        new: NewCustomer,
    ) -> Result<(Customer, bool), DatabaseError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.customers.iter().find(|c| c.phone == new.phone) {
            return Ok((existing.clone(), false));
        }

        let customer = Customer {
            id: tables.customers.len() as i64 + 1,
            first_name: new.first_name,
            second_name: new.second_name,
            last_name: new.last_name,
            phone: new.phone,
            created_at: Utc::now(),
        };
        tables.customers.push(customer.clone());
        Ok((customer, true))
    }

    async fn create_feedback(&self, new: NewFeedback) -> Result<Feedback, DatabaseError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.customers.iter().any(|c| c.id == new.customer_id) {
            return Err(DatabaseError::new(DatabaseErrorKind::ForeignKeyViolation {
                constraint: Some("feedback_customer_id_fkey".to_string()),
            }));
        }

        let feedback = Feedback {
            id: tables.feedback.len() as i64 + 1,
            customer_id: new.customer_id,
            rating: Some(new.rating),
            comments: new.comments,
            created_at: Utc::now(),
        };
        tables.feedback.push(feedback.clone());
        Ok(feedback)
    }

    async fn list_customers_with_feedback(
        &self,
    ) -> Result<Vec<CustomerWithFeedback>, DatabaseError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(group_feedback(
            tables.customers.clone(),
            tables.feedback.clone(),
        ))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check()
    }
}

/// Notifier that remembers every message instead of sending it
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.failing.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackNotifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));

        if self.failing.load(Ordering::SeqCst) {
            Err(NotificationError::Rejected {
                status: 500,
                body: "provider down".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
