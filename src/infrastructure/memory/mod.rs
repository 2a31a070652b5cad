//! In-process store for the test suites.
//!
//! [`MemoryStore`] implements every repository trait. Transactions take
//! per-row async locks that are held until commit or rollback, mirroring
//! `SELECT ... FOR UPDATE`. A commit publishes all of its writes at once.

pub mod memory_store;

pub use memory_store::MemoryStore;
