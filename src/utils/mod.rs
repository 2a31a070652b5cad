//! Helpers shared across layers.
//!
//! - [`currency`] - Supported currency codes and their validator
//! - [`db_error`] - SQLSTATE classification into [`crate::domain::repositories::StoreError`]
//! - [`password`] - argon2 password hashing

pub mod currency;
pub mod db_error;
pub mod password;
