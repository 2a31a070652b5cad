//! PostgreSQL implementation of the ledger store.
//!
//! Transactions run at READ COMMITTED. Account rows are locked with
//! `SELECT ... FOR NO KEY UPDATE`, which blocks concurrent writers of the same
//! row but not the `KEY SHARE` locks taken by foreign key checks when
//! transfers and entries are inserted. Every transaction sets a local
//! `lock_timeout`, so a stuck lock wait fails with SQLSTATE 55P03 instead of
//! hanging the request.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::{Account, Entry, NewEntry, NewTransfer, Transfer};
use crate::domain::repositories::{LedgerStore, LedgerTx, StoreError};

/// PostgreSQL ledger store.
pub struct PgLedgerStore {
    pool: Arc<PgPool>,
    lock_timeout_ms: u64,
}

impl PgLedgerStore {
    /// Creates a store whose transactions wait at most `lock_timeout_ms` for a
    /// row lock. Zero disables the bound.
    pub fn new(pool: Arc<PgPool>, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // SET does not accept bind parameters; the value is an integer.
        let set_timeout = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms);
        sqlx::query(&set_timeout).execute(&mut *tx).await?;

        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn find_transfer(&self, id: i64) -> Result<Option<Transfer>, StoreError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at
            FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(transfer)
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount, created_at
            FROM entries
            WHERE account_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(entries)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

/// One PostgreSQL transaction. Dropping it without commit rolls it back.
struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn get_account_for_update(&mut self, id: i64) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner, balance, currency, created_at
            FROM accounts
            WHERE id = $1
            FOR NO KEY UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(account)
    }

    async fn update_account_balance(
        &mut self,
        id: i64,
        balance: i64,
    ) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = $2
            WHERE id = $1
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(id)
        .bind(balance)
        .fetch_optional(&mut *self.tx)
        .await?;

        account.ok_or(StoreError::NotFound)
    }

    async fn create_transfer(&mut self, new_transfer: NewTransfer) -> Result<Transfer, StoreError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(new_transfer.from_account_id)
        .bind(new_transfer.to_account_id)
        .bind(new_transfer.amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(transfer)
    }

    async fn create_entry(&mut self, new_entry: NewEntry) -> Result<Entry, StoreError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (account_id, amount)
            VALUES ($1, $2)
            RETURNING id, account_id, amount, created_at
            "#,
        )
        .bind(new_entry.account_id)
        .bind(new_entry.amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
