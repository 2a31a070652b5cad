//! DTOs for transfer endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::account::{AccountResponse, EntryResponse};
use crate::application::services::TransferOutcome;
use crate::domain::entities::Transfer;
use crate::utils::currency::validate_currency;

/// Request to move money out of one of the caller's accounts.
///
/// `amount` is in minor currency units.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransferRequest {
    #[validate(range(min = 1))]
    pub from_account_id: i64,

    #[validate(range(min = 1))]
    pub to_account_id: i64,

    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,

    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
}

/// A transfer as returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            id: transfer.id,
            from_account_id: transfer.from_account_id,
            to_account_id: transfer.to_account_id,
            amount: transfer.amount,
            created_at: transfer.created_at,
        }
    }
}

/// Everything a committed transfer wrote.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResultResponse {
    pub transfer: TransferResponse,
    pub from_account: AccountResponse,
    pub to_account: AccountResponse,
    pub from_entry: EntryResponse,
    pub to_entry: EntryResponse,
}

impl From<TransferOutcome> for TransferResultResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            transfer: outcome.transfer.into(),
            from_account: outcome.from_account.into(),
            to_account: outcome.to_account.into(),
            from_entry: outcome.from_entry.into(),
            to_entry: outcome.to_entry.into(),
        }
    }
}
