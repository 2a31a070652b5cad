//! Handlers for money transfers.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::transfer::{CreateTransferRequest, TransferResponse, TransferResultResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::token::TokenPayload;

/// Moves money out of one of the caller's accounts.
///
/// # Endpoint
///
/// `POST /transfers`
///
/// # Request Body
///
/// ```json
/// { "from_account_id": 1, "to_account_id": 2, "amount": 30, "currency": "USD" }
/// ```
///
/// # Checks
///
/// 1. Source account exists and holds `currency`
/// 2. Caller owns the source account
/// 3. Destination account exists and holds `currency`
/// 4. The transfer engine re-checks everything under row locks
///
/// # Errors
///
/// - 400 Bad Request on validation failure, currency mismatch or
///   insufficient funds
/// - 403 Forbidden if the caller does not own the source account
/// - 404 Not Found if either account does not exist
/// - 409 Conflict if the database aborted the transaction; safe to retry
/// - 503 Service Unavailable if a row lock could not be acquired in time
pub async fn create_transfer_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<TokenPayload>,
    Json(payload): Json<CreateTransferRequest>,
) -> Result<Json<TransferResultResponse>, AppError> {
    payload.validate()?;

    let from_account = state
        .account_service
        .get_account_in_currency(payload.from_account_id, &payload.currency)
        .await?;

    if !from_account.is_owned_by(&auth.username) {
        return Err(AppError::forbidden(
            "From account doesn't belong to the authenticated user",
            json!({ "account_id": from_account.id }),
        ));
    }

    state
        .account_service
        .get_account_in_currency(payload.to_account_id, &payload.currency)
        .await?;

    let outcome = state
        .transfer_service
        .execute_transfer(
            payload.from_account_id,
            payload.to_account_id,
            payload.amount,
        )
        .await?;

    Ok(Json(outcome.into()))
}

/// Returns a transfer touching one of the caller's accounts.
///
/// # Endpoint
///
/// `GET /transfers/{id}`
///
/// # Errors
///
/// - 404 Not Found if the transfer does not exist
/// - 403 Forbidden if the caller owns neither side
pub async fn get_transfer_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<TokenPayload>,
    Path(id): Path<i64>,
) -> Result<Json<TransferResponse>, AppError> {
    let transfer = state.transfer_service.get_transfer(id).await?;

    let from_account = state
        .account_service
        .get_account(transfer.from_account_id)
        .await?;
    let to_account = state
        .account_service
        .get_account(transfer.to_account_id)
        .await?;

    if !from_account.is_owned_by(&auth.username) && !to_account.is_owned_by(&auth.username) {
        return Err(AppError::forbidden(
            "Transfer doesn't involve the authenticated user",
            json!({ "transfer_id": id }),
        ));
    }

    Ok(Json(transfer.into()))
}
