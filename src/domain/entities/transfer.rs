//! Transfer entity recording a completed money movement.

use chrono::{DateTime, Utc};

/// An immutable record of `amount` moved from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Returns true if `account_id` is either side of this transfer.
    pub fn involves(&self, account_id: i64) -> bool {
        self.from_account_id == account_id || self.to_account_id == account_id
    }
}

/// Input data for recording a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}
