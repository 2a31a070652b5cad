//! Ledger entry entity.

use chrono::{DateTime, Utc};

/// One signed ledger line: negative for a debit, positive for a credit.
///
/// Every transfer produces exactly two entries whose amounts sum to zero.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Input data for recording an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub account_id: i64,
    pub amount: i64,
}

impl NewEntry {
    /// Debit line for `amount` taken out of `account_id`.
    pub fn debit(account_id: i64, amount: i64) -> Self {
        Self {
            account_id,
            amount: -amount,
        }
    }

    /// Credit line for `amount` paid into `account_id`.
    pub fn credit(account_id: i64, amount: i64) -> Self {
        Self { account_id, amount }
    }
}
