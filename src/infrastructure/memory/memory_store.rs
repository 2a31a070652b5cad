//! In-process implementation of the user, account and ledger stores.
//!
//! Used by the test suites to exercise the services without PostgreSQL.
//! Row locks are real `tokio` mutexes, so concurrent transfers
//! contend exactly as they would on the database.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::OwnedMutexGuard;

use crate::domain::entities::{
    Account, Entry, NewAccount, NewEntry, NewTransfer, NewUser, Transfer, User,
};
use crate::domain::repositories::{
    AccountRepository, LedgerStore, LedgerTx, StoreError, UserRepository,
};
use crate::error::AppError;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One account row: the committed value plus the row lock writers take.
struct AccountRow {
    lock: Arc<tokio::sync::Mutex<()>>,
    committed: Mutex<Account>,
}

#[derive(Default)]
struct Inner {
    /// Commits publish under the write side; ledger reads hold the read side,
    /// so a balance is never visible without its transfer and entries.
    commit_gate: RwLock<()>,
    users: Mutex<HashMap<String, User>>,
    accounts: RwLock<BTreeMap<i64, Arc<AccountRow>>>,
    transfers: Mutex<BTreeMap<i64, Transfer>>,
    entries: Mutex<BTreeMap<i64, Entry>>,
    next_account_id: AtomicI64,
    next_transfer_id: AtomicI64,
    next_entry_id: AtomicI64,
    transactions_started: AtomicUsize,
}

impl Inner {
    fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.commit_gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.commit_gate.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn row(&self, id: i64) -> Option<Arc<AccountRow>> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn account_exists(&self, id: i64) -> bool {
        self.row(id).is_some()
    }
}

/// Bank store kept in process memory.
///
/// Ids are allocated from sequences that are not rolled back, like database
/// sequences. Cloning shares the same underlying data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
    lock_timeout: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store with a 5 second lock-wait timeout.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an empty store with a custom lock-wait timeout.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            lock_timeout,
        }
    }

    /// Inserts a user with an unusable password hash.
    ///
    /// Handy for tests that only need an account owner to exist.
    pub fn seed_user(&self, username: &str) {
        let now = Utc::now();
        lock(&self.inner.users)
            .entry(username.to_string())
            .or_insert_with(|| User {
                username: username.to_string(),
                hashed_password: String::new(),
                full_name: username.to_string(),
                email: format!("{username}@example.com"),
                password_changed_at: now,
                created_at: now,
            });
    }

    /// Number of committed transfers.
    pub fn transfer_count(&self) -> usize {
        let _gate = self.inner.read_gate();
        lock(&self.inner.transfers).len()
    }

    /// Number of committed entries.
    pub fn entry_count(&self) -> usize {
        let _gate = self.inner.read_gate();
        lock(&self.inner.entries).len()
    }

    /// Number of transactions ever opened.
    pub fn transactions_started(&self) -> usize {
        self.inner.transactions_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = lock(&self.inner.users);

        if users.contains_key(&new_user.username) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_pkey" }),
            ));
        }
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_email_key" }),
            ));
        }

        let now = Utc::now();
        let user = User {
            username: new_user.username,
            hashed_password: new_user.hashed_password,
            full_name: new_user.full_name,
            email: new_user.email,
            password_changed_at: now,
            created_at: now,
        };
        users.insert(user.username.clone(), user.clone());

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(lock(&self.inner.users).get(username).cloned())
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create(&self, new_account: NewAccount) -> Result<Account, AppError> {
        if !lock(&self.inner.users).contains_key(&new_account.owner) {
            return Err(AppError::forbidden(
                "Referenced record does not exist",
                json!({ "constraint": "accounts_owner_fkey" }),
            ));
        }

        let mut accounts = self
            .inner
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let duplicate = accounts.values().any(|row| {
            let account = lock(&row.committed);
            account.owner == new_account.owner && account.currency == new_account.currency
        });
        if duplicate {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "owner_currency_key" }),
            ));
        }

        let id = self.inner.next_account_id.fetch_add(1, Ordering::SeqCst) + 1;
        let account = Account::new(
            id,
            new_account.owner,
            new_account.balance,
            new_account.currency,
            Utc::now(),
        );

        accounts.insert(
            id,
            Arc::new(AccountRow {
                lock: Arc::new(tokio::sync::Mutex::new(())),
                committed: Mutex::new(account.clone()),
            }),
        );

        Ok(account)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AppError> {
        let _gate = self.inner.read_gate();
        Ok(self.inner.row(id).map(|row| lock(&row.committed).clone()))
    }

    async fn list_by_owner(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, AppError> {
        let _gate = self.inner.read_gate();
        let accounts = self
            .inner
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        Ok(accounts
            .values()
            .map(|row| lock(&row.committed).clone())
            .filter(|account| account.owner == owner)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        self.inner
            .transactions_started
            .fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryTx {
            inner: self.inner.clone(),
            lock_timeout: self.lock_timeout,
            locked: HashMap::new(),
            staged_accounts: HashMap::new(),
            staged_transfers: Vec::new(),
            staged_entries: Vec::new(),
        }))
    }

    async fn find_transfer(&self, id: i64) -> Result<Option<Transfer>, StoreError> {
        let _gate = self.inner.read_gate();
        Ok(lock(&self.inner.transfers).get(&id).cloned())
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let _gate = self.inner.read_gate();
        Ok(lock(&self.inner.entries)
            .values()
            .filter(|entry| entry.account_id == account_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A transaction over [`MemoryStore`].
///
/// Writes are staged and applied on commit while every row lock is still
/// held. Dropping the transaction discards the staged writes and releases the
/// locks.
struct MemoryTx {
    inner: Arc<Inner>,
    lock_timeout: Duration,
    locked: HashMap<i64, (Arc<AccountRow>, OwnedMutexGuard<()>)>,
    staged_accounts: HashMap<i64, Account>,
    staged_transfers: Vec<Transfer>,
    staged_entries: Vec<Entry>,
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn get_account_for_update(&mut self, id: i64) -> Result<Option<Account>, StoreError> {
        if let Some(account) = self.staged_accounts.get(&id) {
            return Ok(Some(account.clone()));
        }

        let Some(row) = self.inner.row(id) else {
            return Ok(None);
        };

        let guard = tokio::time::timeout(self.lock_timeout, row.lock.clone().lock_owned())
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!("lock wait timeout on account {id}"))
            })?;

        let account = lock(&row.committed).clone();
        self.staged_accounts.insert(id, account.clone());
        self.locked.insert(id, (row, guard));

        Ok(Some(account))
    }

    async fn update_account_balance(
        &mut self,
        id: i64,
        balance: i64,
    ) -> Result<Account, StoreError> {
        if self.get_account_for_update(id).await?.is_none() {
            return Err(StoreError::NotFound);
        }

        let account = self
            .staged_accounts
            .get_mut(&id)
            .ok_or(StoreError::NotFound)?;
        account.balance = balance;

        Ok(account.clone())
    }

    async fn create_transfer(&mut self, new_transfer: NewTransfer) -> Result<Transfer, StoreError> {
        if new_transfer.amount <= 0 {
            return Err(StoreError::Constraint(
                "transfers_amount_check".to_string(),
            ));
        }
        if !self.inner.account_exists(new_transfer.from_account_id)
            || !self.inner.account_exists(new_transfer.to_account_id)
        {
            return Err(StoreError::Constraint("transfers_account_fkey".to_string()));
        }

        let transfer = Transfer {
            id: self.inner.next_transfer_id.fetch_add(1, Ordering::SeqCst) + 1,
            from_account_id: new_transfer.from_account_id,
            to_account_id: new_transfer.to_account_id,
            amount: new_transfer.amount,
            created_at: Utc::now(),
        };
        self.staged_transfers.push(transfer.clone());

        Ok(transfer)
    }

    async fn create_entry(&mut self, new_entry: NewEntry) -> Result<Entry, StoreError> {
        if !self.inner.account_exists(new_entry.account_id) {
            return Err(StoreError::Constraint(
                "entries_account_id_fkey".to_string(),
            ));
        }

        let entry = Entry {
            id: self.inner.next_entry_id.fetch_add(1, Ordering::SeqCst) + 1,
            account_id: new_entry.account_id,
            amount: new_entry.amount,
            created_at: Utc::now(),
        };
        self.staged_entries.push(entry.clone());

        Ok(entry)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        let _gate = self.inner.write_gate();

        for (id, account) in self.staged_accounts.drain() {
            if let Some((row, _guard)) = self.locked.get(&id) {
                *lock(&row.committed) = account;
            }
        }

        {
            let mut transfers = lock(&self.inner.transfers);
            for transfer in self.staged_transfers.drain(..) {
                transfers.insert(transfer.id, transfer);
            }
        }

        {
            let mut entries = lock(&self.inner.entries);
            for entry in self.staged_entries.drain(..) {
                entries.insert(entry.id, entry);
            }
        }

        // Row locks are released when `self` drops here.
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
