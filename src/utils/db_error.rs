//! Classification of driver errors for the ledger store.

use crate::domain::repositories::StoreError;

/// SQLSTATE codes that abort a transaction to keep it isolated.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
/// Raised when `lock_timeout` expires while waiting for a row lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";
const QUERY_CANCELED: &str = "57014";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Database(db) => {
                let code = db.code();
                match code.as_deref() {
                    Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                        StoreError::Conflict(e.to_string())
                    }
                    Some(LOCK_NOT_AVAILABLE | QUERY_CANCELED) => {
                        StoreError::Unavailable(e.to_string())
                    }
                    _ if db.is_unique_violation()
                        || db.is_foreign_key_violation()
                        || db.is_check_violation() =>
                    {
                        StoreError::Constraint(e.to_string())
                    }
                    _ => StoreError::Internal(e.to_string()),
                }
            }
            _ => StoreError::Internal(e.to_string()),
        }
    }
}
