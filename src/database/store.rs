//! The data-store seam handlers depend on. `PgDataStore` is the production
//! implementation; tests plug in their own.

use crate::database::customer_repository::{Customer, CustomerRepository, NewCustomer};
use crate::database::error::DatabaseError;
use crate::database::feedback_repository::{Feedback, FeedbackRepository, NewFeedback};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;

/// A customer together with every feedback record they left
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerWithFeedback {
    pub customer: Customer,
    pub feedback: Vec<Feedback>,
}

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, DatabaseError>;

    /// Look up by phone and insert when absent; true when inserted
    async fn get_or_create_customer(
        &self,
        new: NewCustomer,
    ) -> Result<(Customer, bool), DatabaseError>;

    async fn create_feedback(&self, new: NewFeedback) -> Result<Feedback, DatabaseError>;

    async fn list_customers_with_feedback(
        &self,
    ) -> Result<Vec<CustomerWithFeedback>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Attach feedback to customers, keeping the input order of both lists
pub fn group_feedback(
    customers: Vec<Customer>,
    feedback: Vec<Feedback>,
) -> Vec<CustomerWithFeedback> {
    let mut by_customer: HashMap<i64, Vec<Feedback>> = HashMap::new();
    for fb in feedback {
        by_customer.entry(fb.customer_id).or_default().push(fb);
    }

    customers
        .into_iter()
        .map(|customer| CustomerWithFeedback {
            feedback: by_customer.remove(&customer.id).unwrap_or_default(),
            customer,
        })
        .collect()
}

pub struct PgDataStore {
    pool: PgPool,
    customers: CustomerRepository,
    feedback: FeedbackRepository,
}

impl PgDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool.clone()),
            feedback: FeedbackRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl DataStore for PgDataStore {
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, DatabaseError> {
        self.customers.find_by_phone(phone).await
    }

    async fn get_or_create_customer(
        &self,
        new: NewCustomer,
    ) -> Result<(Customer, bool), DatabaseError> {
        self.customers.get_or_create(&new).await
    }

    async fn create_feedback(&self, new: NewFeedback) -> Result<Feedback, DatabaseError> {
        self.feedback.create(&new).await
    }

    async fn list_customers_with_feedback(
        &self,
    ) -> Result<Vec<CustomerWithFeedback>, DatabaseError> {
        let customers = self.customers.list_all().await?;
        let feedback = self.feedback.list_all().await?;
        Ok(group_feedback(customers, feedback))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        super::health_check(&self.pool).await
    }
}
