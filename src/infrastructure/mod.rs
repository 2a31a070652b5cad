//! Infrastructure layer for external integrations.
//!
//! This layer implements the repository traits defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repositories and ledger store
//! - [`memory`] - In-process store with the same locking semantics, used by
//!   tests and for running without a database

pub mod memory;
pub mod persistence;
