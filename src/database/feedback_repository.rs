use crate::database::error::DatabaseError;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// Feedback entity. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub customer_id: i64,
    pub rating: Option<i32>,
    pub comments: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub customer_id: i64,
    pub rating: i32,
    pub comments: Option<String>,
}

/// Repository for feedback records
pub struct FeedbackRepository {
    pool: PgPool,
}

impl FeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: &NewFeedback) -> Result<Feedback, DatabaseError> {
        sqlx::query_as::<_, Feedback>(
            "INSERT INTO feedback (customer_id, rating, comments)
             VALUES ($1, $2, $3)
             RETURNING id, customer_id, rating, comments, created_at",
        )
        .bind(new.customer_id)
        .bind(new.rating)
        .bind(&new.comments)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn list_all(&self) -> Result<Vec<Feedback>, DatabaseError> {
        sqlx::query_as::<_, Feedback>(
            "SELECT id, customer_id, rating, comments, created_at
             FROM feedback
             ORDER BY customer_id ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
