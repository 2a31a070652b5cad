//! Handlers for account endpoints. All require an authenticated caller.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::api::dto::account::{AccountResponse, CreateAccountRequest, EntryResponse};
use crate::api::dto::pagination::PaginationParams;
use crate::error::AppError;
use crate::state::AppState;
use crate::token::TokenPayload;

/// Opens an account with a zero balance for the caller.
///
/// # Endpoint
///
/// `POST /accounts`
///
/// # Errors
///
/// - 400 Bad Request if the currency is not supported
/// - 409 Conflict if the caller already has an account in this currency
pub async fn create_account_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<TokenPayload>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    payload.validate()?;

    let account = state
        .account_service
        .create_account(&auth.username, &payload.currency)
        .await?;

    Ok(Json(account.into()))
}

/// Returns one of the caller's accounts.
///
/// # Endpoint
///
/// `GET /accounts/{id}`
///
/// # Errors
///
/// - 404 Not Found if the account does not exist
/// - 403 Forbidden if another user owns it
pub async fn get_account_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<TokenPayload>,
    Path(id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .account_service
        .get_owned_account(id, &auth.username)
        .await?;

    Ok(Json(account.into()))
}

/// Lists the caller's accounts ordered by id.
///
/// # Endpoint
///
/// `GET /accounts?page_id=1&page_size=5`
pub async fn list_accounts_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<TokenPayload>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let (page_id, page_size) = params.validate()?;

    let accounts = state
        .account_service
        .list_accounts(&auth.username, page_id, page_size)
        .await?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// Lists ledger entries of one of the caller's accounts.
///
/// # Endpoint
///
/// `GET /accounts/{id}/entries?page_id=1&page_size=5`
///
/// # Errors
///
/// - 404 Not Found if the account does not exist
/// - 403 Forbidden if another user owns it
pub async fn list_entries_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<TokenPayload>,
    Path(id): Path<i64>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<EntryResponse>>, AppError> {
    let (offset, limit) = params.offset_limit()?;

    let account = state
        .account_service
        .get_owned_account(id, &auth.username)
        .await?;

    let entries = state
        .transfer_service
        .list_entries(account.id, limit, offset)
        .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
