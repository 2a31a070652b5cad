//! Core domain entities representing the ledger data model.
//!
//! Entities are plain data structures. Balances are only ever mutated through
//! the transactional ledger operations in
//! [`crate::domain::repositories::LedgerTx`].
//!
//! # Entity Types
//!
//! - [`User`] - A registered identity that can own accounts
//! - [`Account`] - A balance held in one currency by one owner
//! - [`Transfer`] - An immutable record of a completed money movement
//! - [`Entry`] - One signed ledger line for one account
//!
//! Creation inputs use separate `New*` structs.

pub mod account;
pub mod entry;
pub mod transfer;
pub mod user;

pub use account::{Account, NewAccount};
pub use entry::{Entry, NewEntry};
pub use transfer::{NewTransfer, Transfer};
pub use user::{NewUser, User};
