//! Domain layer containing ledger entities and store contracts.
//!
//! The domain layer has no dependencies on the HTTP or persistence layers.
//!
//! # Architecture
//!
//! - [`entities`] - Users, accounts, transfers and ledger entries
//! - [`repositories`] - Data access traits, including the transactional
//!   [`repositories::LedgerStore`]
//!
//! # Transfer Flow
//!
//! 1. The authorization middleware attaches the caller's token payload
//! 2. The transfer handler checks ownership and currency
//! 3. [`crate::application::services::TransferService`] opens a
//!    [`repositories::LedgerTx`], locks both accounts in id order and writes
//!    the transfer, two entries and two balances
//! 4. The transaction commits, or rolls back on any error

pub mod entities;
pub mod repositories;
