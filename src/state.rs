//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AccountService, TransferService, UserService};
use crate::domain::repositories::{AccountRepository, LedgerStore, UserRepository};
use crate::token::TokenMaker;

/// Services behind trait objects, so the same handlers run over PostgreSQL
/// or the in-process store.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<dyn UserRepository>>,
    pub account_service: Arc<AccountService<dyn AccountRepository>>,
    pub transfer_service: Arc<TransferService<dyn LedgerStore>>,
    pub token_maker: Arc<dyn TokenMaker>,
}
