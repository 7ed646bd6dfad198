use crate::error::{AppError, AppErrorKind, InfrastructureError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    NotFound { entity: String, id: String },
    UniqueViolation { constraint: Option<String> },
    ForeignKeyViolation { constraint: Option<String> },
    ConnectionFailed,
    PoolTimeout,
    Migration,
    Query,
}

#[derive(Debug, Clone)]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
    pub message: String,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let message = match &kind {
            DatabaseErrorKind::NotFound { entity, id } => format!("{} '{}' not found", entity, id),
            DatabaseErrorKind::UniqueViolation { constraint } => {
                format!("unique constraint violated: {:?}", constraint)
            }
            DatabaseErrorKind::ForeignKeyViolation { constraint } => {
                format!("foreign key constraint violated: {:?}", constraint)
            }
            DatabaseErrorKind::ConnectionFailed => "database connection failed".to_string(),
            DatabaseErrorKind::PoolTimeout => "timed out acquiring a connection".to_string(),
            DatabaseErrorKind::Migration => "migration failed".to_string(),
            DatabaseErrorKind::Query => "query failed".to_string(),
        };
        Self { kind, message }
    }

    pub fn from_sqlx(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::RowNotFound => DatabaseErrorKind::NotFound {
                entity: "row".to_string(),
                id: String::new(),
            },
            sqlx::Error::PoolTimedOut => DatabaseErrorKind::PoolTimeout,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                DatabaseErrorKind::ConnectionFailed
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseErrorKind::UniqueViolation {
                    constraint: db_err.constraint().map(str::to_string),
                }
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DatabaseErrorKind::ForeignKeyViolation {
                    constraint: db_err.constraint().map(str::to_string),
                }
            }
            _ => DatabaseErrorKind::Query,
        };

        Self {
            kind,
            message: err.to_string(),
        }
    }

    pub fn from_migration(err: sqlx::migrate::MigrateError) -> Self {
        Self {
            kind: DatabaseErrorKind::Migration,
            message: err.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            DatabaseErrorKind::ConnectionFailed | DatabaseErrorKind::PoolTimeout
        )
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DatabaseError {}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::new(AppErrorKind::Infrastructure(InfrastructureError::Database {
            is_retryable: err.is_retryable(),
            message: err.message,
        }))
    }
}
