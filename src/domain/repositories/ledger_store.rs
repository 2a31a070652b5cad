//! Transactional ledger store.
//!
//! Every balance mutation happens inside a [`LedgerTx`]. A transaction holds
//! the row locks it acquired through [`LedgerTx::get_account_for_update`]
//! until it is committed or rolled back; dropping an uncommitted transaction
//! rolls it back.
//!
//! # Scoped execution
//!
//! [`within_transaction`] runs a closure against a fresh transaction and
//! commits only when the closure returns `Ok`:
//!
//! ```rust,ignore
//! let account = within_transaction(store.as_ref(), move |tx| {
//!     Box::pin(async move {
//!         let account = tx.get_account_for_update(id).await?;
//!         Ok::<_, StoreError>(account)
//!     })
//! })
//! .await?;
//! ```

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{Account, Entry, NewEntry, NewTransfer, Transfer};

/// Errors reported by the ledger store.
///
/// Messages may contain driver detail and are meant for logs only.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    /// The store aborted the transaction to preserve isolation. Safe to retry.
    #[error("serialization conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or a lock wait timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Returns true if retrying the whole unit of work may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Boxed future returned by closures passed to [`within_transaction`].
pub type TxFuture<'t, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 't>>;

/// Factory for transactions plus the read side of the ledger.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLedgerStore`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryStore`] - in-process implementation
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if no connection can be acquired.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    /// Finds a committed transfer by id.
    async fn find_transfer(&self, id: i64) -> Result<Option<Transfer>, StoreError>;

    /// Lists committed entries of an account, newest id last.
    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError>;

    /// Cheap connectivity check for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// A single all-or-nothing unit of work.
#[async_trait]
pub trait LedgerTx: Send {
    /// Reads an account and takes an exclusive row lock held until the
    /// transaction ends.
    ///
    /// Returns `Ok(None)` if the account does not exist.
    async fn get_account_for_update(&mut self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Writes a new balance for an account.
    ///
    /// Callers must hold the row lock from [`Self::get_account_for_update`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the account does not exist.
    async fn update_account_balance(&mut self, id: i64, balance: i64)
    -> Result<Account, StoreError>;

    /// Inserts a transfer row.
    async fn create_transfer(&mut self, new_transfer: NewTransfer) -> Result<Transfer, StoreError>;

    /// Inserts a ledger entry.
    async fn create_entry(&mut self, new_entry: NewEntry) -> Result<Entry, StoreError>;

    /// Makes every write of this transaction visible and releases its locks.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discards every write of this transaction and releases its locks.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Runs `f` inside a transaction.
///
/// Commits if `f` returns `Ok`, rolls back otherwise. A failed rollback is
/// logged and the original error is returned.
///
/// # Errors
///
/// Returns the closure's error, or the store error from `begin`/`commit`.
pub async fn within_transaction<S, T, E, F>(store: &S, f: F) -> Result<T, E>
where
    S: LedgerStore + ?Sized,
    E: From<StoreError>,
    F: for<'t> FnOnce(&'t mut Box<dyn LedgerTx>) -> TxFuture<'t, T, E>,
{
    let mut tx = store.begin().await?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(StoreError::Conflict("40001".to_string()).is_retryable());
        assert!(!StoreError::Unavailable("timeout".to_string()).is_retryable());
        assert!(!StoreError::NotFound.is_retryable());
        assert!(!StoreError::Constraint("check".to_string()).is_retryable());
    }
}
