//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the identity store. They are implemented by the
//! PostgreSQL repositories in `crate::infrastructure::persistence` and by the
//! in-process [`crate::infrastructure::memory::MemoryStore`].
//!
//! # Available Repositories
//!
//! - [`UserRepository`] - User registration and lookup
//! - [`AccountRepository`] - Account creation and non-locking reads
//! - [`LedgerStore`] / [`LedgerTx`] - Transactional balance movements
//!
//! Mock implementations of the non-transactional traits are generated via
//! `mockall` for unit tests.

pub mod account_repository;
pub mod ledger_store;
pub mod user_repository;

pub use account_repository::AccountRepository;
pub use ledger_store::{LedgerStore, LedgerTx, StoreError, TxFuture, within_transaction};
pub use user_repository::UserRepository;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
