//! Atomic money transfers between accounts.
//!
//! A transfer is one unit of work: both account rows are locked, the
//! transfer and its two entries are written, and both balances are updated,
//! all in a single [`LedgerTx`]. Nothing is visible until commit; any error
//! rolls back every write.
//!
//! # Lock Ordering
//!
//! Row locks are always taken in ascending account id, whatever the
//! direction of the transfer. Two transfers A→B and B→A therefore queue on
//! the same first lock instead of each holding the lock the other needs.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use crate::domain::entities::{Account, Entry, NewEntry, NewTransfer, Transfer};
use crate::domain::repositories::{LedgerStore, LedgerTx, StoreError, within_transaction};
use crate::error::AppError;

/// Typed transfer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("transfer amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("cannot transfer from account {0} to itself")]
    SameAccount(i64),

    #[error("account {0} not found")]
    AccountNotFound(i64),

    #[error("currency mismatch: {from} vs {to}")]
    CurrencyMismatch { from: String, to: String },

    #[error("account {account_id} has balance {balance}, cannot send {amount}")]
    InsufficientFunds {
        account_id: i64,
        balance: i64,
        amount: i64,
    },

    /// The store aborted the transaction; the whole transfer may be retried.
    #[error("transfer aborted by a concurrent transaction")]
    SerializationConflict,

    /// The store is unreachable or a lock wait timed out. Nothing was written.
    #[error("ledger store unavailable")]
    StoreUnavailable,

    #[error("ledger store error: {0}")]
    Store(String),
}

impl TransferError {
    /// Returns true if the caller may retry the whole transfer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::SerializationConflict)
    }

    fn outcome_label(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount(_) | TransferError::SameAccount(_) => "invalid_input",
            TransferError::AccountNotFound(_) => "account_not_found",
            TransferError::CurrencyMismatch { .. } => "currency_mismatch",
            TransferError::InsufficientFunds { .. } => "insufficient_funds",
            TransferError::SerializationConflict => "conflict",
            TransferError::StoreUnavailable => "unavailable",
            TransferError::Store(_) => "store_error",
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => TransferError::SerializationConflict,
            StoreError::Unavailable(reason) => {
                tracing::warn!(error = %reason, "Ledger store unavailable");
                TransferError::StoreUnavailable
            }
            other => TransferError::Store(other.to_string()),
        }
    }
}

/// Whether a transfer may leave the source balance negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverdraftPolicy {
    /// Reject transfers larger than the locked source balance.
    #[default]
    Forbid,
    /// Leave balance limits to the store's own constraints.
    Allow,
}

/// Everything written by one successful transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transfer: Transfer,
    pub from_entry: Entry,
    pub to_entry: Entry,
    pub from_account: Account,
    pub to_account: Account,
}

/// Service executing transfers against a [`LedgerStore`].
pub struct TransferService<S: LedgerStore + ?Sized> {
    store: Arc<S>,
    overdraft: OverdraftPolicy,
}

impl<S: LedgerStore + ?Sized> TransferService<S> {
    /// Creates a transfer service that forbids overdrafts.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_overdraft_policy(store, OverdraftPolicy::default())
    }

    /// Creates a transfer service with an explicit overdraft policy.
    pub fn with_overdraft_policy(store: Arc<S>, overdraft: OverdraftPolicy) -> Self {
        Self { store, overdraft }
    }

    /// Moves `amount` from one account to another, all-or-nothing.
    ///
    /// The caller must already have checked that the acting identity owns
    /// `from_account_id`.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidAmount`] / [`TransferError::SameAccount`]
    ///   before the store is touched
    /// - [`TransferError::AccountNotFound`] if either account is missing
    /// - [`TransferError::CurrencyMismatch`] if the currencies differ
    /// - [`TransferError::InsufficientFunds`] if overdrafts are forbidden and
    ///   the locked source balance is too low
    /// - [`TransferError::SerializationConflict`] (retryable) and
    ///   [`TransferError::StoreUnavailable`] from the store
    pub async fn execute_transfer(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<TransferOutcome, TransferError> {
        let result = self
            .run_transfer(from_account_id, to_account_id, amount)
            .await;

        match &result {
            Ok(outcome) => {
                metrics::counter!("bank_transfers_total", "outcome" => "committed").increment(1);
                tracing::info!(
                    transfer_id = outcome.transfer.id,
                    from_account_id,
                    to_account_id,
                    amount,
                    "Transfer committed"
                );
            }
            Err(err) => {
                metrics::counter!("bank_transfers_total", "outcome" => err.outcome_label())
                    .increment(1);
                tracing::debug!(
                    from_account_id,
                    to_account_id,
                    amount,
                    error = %err,
                    "Transfer rejected"
                );
            }
        }

        result
    }

    async fn run_transfer(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<TransferOutcome, TransferError> {
        if amount <= 0 {
            return Err(TransferError::InvalidAmount(amount));
        }
        if from_account_id == to_account_id {
            return Err(TransferError::SameAccount(from_account_id));
        }

        let overdraft = self.overdraft;

        within_transaction(self.store.as_ref(), move |tx| {
            Box::pin(async move {
                transfer_in_tx(tx, from_account_id, to_account_id, amount, overdraft).await
            })
        })
        .await
    }

    /// Finds a committed transfer.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the transfer does not exist.
    pub async fn get_transfer(&self, id: i64) -> Result<Transfer, AppError> {
        self.store
            .find_transfer(id)
            .await?
            .ok_or_else(|| AppError::not_found("Transfer not found", json!({ "transfer_id": id })))
    }

    /// Lists committed entries of an account.
    ///
    /// Ownership is checked by the caller.
    pub async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, AppError> {
        Ok(self.store.list_entries(account_id, limit, offset).await?)
    }

    /// Returns true if the store answers.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

/// Body of the transfer transaction.
async fn transfer_in_tx(
    tx: &mut Box<dyn LedgerTx>,
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
    overdraft: OverdraftPolicy,
) -> Result<TransferOutcome, TransferError> {
    let (first_id, second_id) = lock_order(from_account_id, to_account_id);

    let first = tx
        .get_account_for_update(first_id)
        .await?
        .ok_or(TransferError::AccountNotFound(first_id))?;
    let second = tx
        .get_account_for_update(second_id)
        .await?
        .ok_or(TransferError::AccountNotFound(second_id))?;

    let (from, to) = if first.id == from_account_id {
        (first, second)
    } else {
        (second, first)
    };

    if from.currency != to.currency {
        return Err(TransferError::CurrencyMismatch {
            from: from.currency,
            to: to.currency,
        });
    }

    // Checked under the row lock, so no concurrent debit can slip in between.
    if overdraft == OverdraftPolicy::Forbid && from.balance < amount {
        return Err(TransferError::InsufficientFunds {
            account_id: from.id,
            balance: from.balance,
            amount,
        });
    }

    let new_from_balance = from
        .balance
        .checked_sub(amount)
        .ok_or_else(|| TransferError::Store("balance underflow".to_string()))?;
    let new_to_balance = to
        .balance
        .checked_add(amount)
        .ok_or_else(|| TransferError::Store("balance overflow".to_string()))?;

    let transfer = tx
        .create_transfer(NewTransfer {
            from_account_id,
            to_account_id,
            amount,
        })
        .await?;

    let from_entry = tx
        .create_entry(NewEntry::debit(from_account_id, amount))
        .await?;
    let to_entry = tx
        .create_entry(NewEntry::credit(to_account_id, amount))
        .await?;

    // Same global order as the locks.
    let (from_account, to_account) = if from_account_id < to_account_id {
        let from_account = tx
            .update_account_balance(from_account_id, new_from_balance)
            .await?;
        let to_account = tx.update_account_balance(to_account_id, new_to_balance).await?;
        (from_account, to_account)
    } else {
        let to_account = tx.update_account_balance(to_account_id, new_to_balance).await?;
        let from_account = tx
            .update_account_balance(from_account_id, new_from_balance)
            .await?;
        (from_account, to_account)
    };

    Ok(TransferOutcome {
        transfer,
        from_entry,
        to_entry,
        from_account,
        to_account,
    })
}

/// Global lock acquisition order: ascending account id.
fn lock_order(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}
