//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::user_service::UserService`] - Registration and login
//! - [`services::account_service::AccountService`] - Account opening and ownership checks
//! - [`services::transfer_service::TransferService`] - Atomic money transfers

pub mod services;
