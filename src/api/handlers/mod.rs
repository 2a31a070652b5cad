//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod accounts;
pub mod health;
pub mod transfers;
pub mod users;

pub use accounts::{
    create_account_handler, get_account_handler, list_accounts_handler, list_entries_handler,
};
pub use health::health_handler;
pub use transfers::{create_transfer_handler, get_transfer_handler};
pub use users::{create_user_handler, login_user_handler};
