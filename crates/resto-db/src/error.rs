//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller (HTTP layer, CLI) maps to its own response codes               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conflict shapes the core cares about (`DuplicateReturn`,
//! `PayrollRunExists`) get their own variants so the service layer can map a
//! raw UNIQUE violation from a lost race back to the right outcome.

use resto_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A second return was attempted for an already-settled dispatch.
    #[error("Dispatch {dispatch_id} already has a return")]
    DuplicateReturn { dispatch_id: String },

    /// A payroll run already exists for the period.
    #[error("Payroll run already exists for {year}-{month:02}")]
    PayrollRunExists { year: i32, month: u32 },

    /// Domain validation failed before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unique constraint violation not otherwise classified.
    #[error("Duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound { entity: entity.into(), id: id.into() }
    }

    /// True for conflict-shaped errors the caller may treat as satisfied
    /// state rather than failure.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::DuplicateReturn { .. }
                | DbError::PayrollRunExists { .. }
                | DbError::UniqueViolation { .. }
        )
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => DbError::Validation(v),
            CoreError::EmployeeNotFound(id) => DbError::not_found("Employee", id),
            CoreError::DispatchNotFound(id) => DbError::not_found("Dispatch", id),
            CoreError::DuplicateReturn { dispatch_id } => DbError::DuplicateReturn { dispatch_id },
            CoreError::PayrollRunExists { year, month } => {
                DbError::PayrollRunExists { year, month }
            }
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                DbError::NotFound { entity: "Record".to_string(), id: "unknown".to_string() }
            }

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation { message: msg.to_string() }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        assert!(DbError::DuplicateReturn { dispatch_id: "d1".into() }.is_conflict());
        assert!(DbError::PayrollRunExists { year: 2025, month: 11 }.is_conflict());
        assert!(!DbError::not_found("Employee", "e1").is_conflict());
    }

    #[test]
    fn test_core_error_mapping() {
        let err: DbError = CoreError::PayrollRunExists { year: 2025, month: 3 }.into();
        assert!(matches!(err, DbError::PayrollRunExists { year: 2025, month: 3 }));
    }
}
