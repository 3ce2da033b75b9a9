//! # Database Error Types
//!
//! Storage failures, classified by what the service layer needs to tell apart.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error                                                            │
//! │    ├── Database(e) where e.is_unique_violation()                       │
//! │    │       → UniqueViolation { columns }                               │
//! │    │            columns == COUPON_PERIOD_COLUMNS → period conflict     │
//! │    │            (CouponService reports it as DuplicateCoupon)          │
//! │    ├── Database(e) where e.is_foreign_key_violation()                  │
//! │    │       → ForeignKeyViolation   (coupon for an unknown user)        │
//! │    ├── Database(e) where e.is_check_violation()                        │
//! │    │       → CheckViolation        (month or status out of domain)     │
//! │    ├── Database(other)             → QueryFailed                       │
//! │    ├── RowNotFound                 → NotFound                          │
//! │    ├── PoolTimedOut / PoolClosed   → PoolExhausted / ConnectionFailed  │
//! │    └── anything else               → Internal                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::DatabaseError;
use thiserror::Error;

/// Columns SQLite names when `idx_coupons_monthly_period` rejects a row.
pub const COUPON_PERIOD_COLUMNS: &str = "coupons.vecino_id, coupons.month, coupons.year";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index or primary key rejected the row.
    ///
    /// `columns` is the list SQLite reports, e.g. `users.email`.
    #[error("Unique constraint failed on {columns}")]
    UniqueViolation { columns: String },

    /// A row references a user that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint rejected the row.
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin or commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became available before the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Checks whether a second monthly coupon was rejected for a period.
    ///
    /// Other unique failures on `coupons` (e.g. the primary key) do not match.
    pub fn is_coupon_period_conflict(&self) -> bool {
        matches!(self, DbError::UniqueViolation { columns } if columns == COUPON_PERIOD_COLUMNS)
    }

    fn from_database(err: &dyn DatabaseError) -> Self {
        let message = err.message().to_string();

        if err.is_unique_violation() {
            // "UNIQUE constraint failed: coupons.vecino_id, coupons.month, coupons.year"
            let columns = message
                .split_once("constraint failed: ")
                .map(|(_, columns)| columns.trim().to_string())
                .unwrap_or(message);
            DbError::UniqueViolation { columns }
        } else if err.is_foreign_key_violation() {
            DbError::ForeignKeyViolation { message }
        } else if err.is_check_violation() {
            DbError::CheckViolation { message }
        } else {
            DbError::QueryFailed(message)
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::from_database(db_err.as_ref()),
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
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
    use crate::pool::{Database, DbConfig};
    use crate::repository::CouponStore;
    use chrono::Utc;
    use vecinal_core::coupon::build_monthly_coupon;
    use vecinal_core::{Coupon, GenerationOptions, User};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users()
            .insert(&User {
                id: "v1".to_string(),
                full_name: "Ana Rojas".to_string(),
                email: "v1@example.cl".to_string(),
                rut: "rut-v1".to_string(),
                role: "vecino".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        db
    }

    fn monthly(month: u32) -> Coupon {
        build_monthly_coupon("v1", month, 2025, &GenerationOptions::for_year(2025), Utc::now())
    }

    #[tokio::test]
    async fn test_period_conflict_reports_exact_columns() {
        let db = setup().await;
        let repo = db.coupons();
        repo.insert(&monthly(4)).await.unwrap();

        let err = repo.insert(&monthly(4)).await.unwrap_err();
        match &err {
            DbError::UniqueViolation { columns } => assert_eq!(columns, COUPON_PERIOD_COLUMNS),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_coupon_period_conflict());
    }

    #[tokio::test]
    async fn test_primary_key_collision_is_not_a_period_conflict() {
        let db = setup().await;
        let repo = db.coupons();

        let mut first = monthly(4);
        first.coupon_type = "extraordinaria".to_string();
        repo.insert(&first).await.unwrap();

        let mut same_id = monthly(5);
        same_id.id = first.id.clone();
        same_id.coupon_type = "extraordinaria".to_string();

        let err = repo.insert(&same_id).await.unwrap_err();
        match &err {
            DbError::UniqueViolation { columns } => assert_eq!(columns, "coupons.id"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_coupon_period_conflict());
    }

    #[tokio::test]
    async fn test_check_constraint_is_classified() {
        let db = setup().await;
        let mut bad = monthly(1);
        bad.month = 13;

        let err = db.coupons().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }), "got {err:?}");
    }

    #[test]
    fn test_other_errors() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
        assert!(!DbError::PoolExhausted.is_coupon_period_conflict());
    }
}
