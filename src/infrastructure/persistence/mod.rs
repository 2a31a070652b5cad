//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `sqlx::FromRow`.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - User registration and lookup
//! - [`PgAccountRepository`] - Account creation and plain reads
//! - [`PgLedgerStore`] - Transactions with row locks for transfers

pub mod pg_account_repository;
pub mod pg_ledger_store;
pub mod pg_user_repository;

pub use pg_account_repository::PgAccountRepository;
pub use pg_ledger_store::PgLedgerStore;
pub use pg_user_repository::PgUserRepository;
