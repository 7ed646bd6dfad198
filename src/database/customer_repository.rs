use crate::database::error::DatabaseError;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

/// Customer entity, identified by phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub last_name: String,
    pub phone: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Fields for a customer about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub first_name: String,
    pub second_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Repository for customers
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, DatabaseError> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, first_name, second_name, last_name, phone, created_at
             FROM customers
             WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn list_all(&self) -> Result<Vec<Customer>, DatabaseError> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, first_name, second_name, last_name, phone, created_at
             FROM customers
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Return the customer for `new.phone`, inserting it when absent.
    ///
    /// The boolean is true when this call created the row. Concurrent calls
    /// for one phone resolve to the same row: the insert is conflict-tolerant
    /// and a lost race re-reads the winner.
    pub async fn get_or_create(
        &self,
        new: &NewCustomer,
    ) -> Result<(Customer, bool), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_sqlx)?;

        if let Some(existing) = Self::find_by_phone_in(&mut tx, &new.phone).await? {
            tx.commit().await.map_err(DatabaseError::from_sqlx)?;
            return Ok((existing, false));
        }

        let inserted = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (first_name, second_name, last_name, phone)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (phone) DO NOTHING
             RETURNING id, first_name, second_name, last_name, phone, created_at",
        )
        .bind(&new.first_name)
        .bind(&new.second_name)
        .bind(&new.last_name)
        .bind(&new.phone)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let result = match inserted {
            Some(customer) => (customer, true),
            None => {
                let winner = Self::find_by_phone_in(&mut tx, &new.phone)
                    .await?
                    .ok_or_else(|| DatabaseError::from_sqlx(sqlx::Error::RowNotFound))?;
                (winner, false)
            }
        };

        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok(result)
    }

    async fn find_by_phone_in(
        tx: &mut Transaction<'_, Postgres>,
        phone: &str,
    ) -> Result<Option<Customer>, DatabaseError> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, first_name, second_name, last_name, phone, created_at
             FROM customers
             WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
