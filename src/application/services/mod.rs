//! Business logic services for the application layer.

pub mod account_service;
pub mod transfer_service;
pub mod user_service;

pub use account_service::AccountService;
pub use transfer_service::{OverdraftPolicy, TransferError, TransferOutcome, TransferService};
pub use user_service::{LoginOutcome, UserService};
