//! HTTP-facing error type.
//!
//! Every handler returns [`AppError`], rendered as:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Account not found", "details": {} } }
//! ```
//!
//! Store and driver detail is logged, never rendered.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::application::services::TransferError;
use crate::domain::repositories::StoreError;
use crate::token::TokenError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    #[error("{message}")]
    Forbidden { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    Unavailable { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::Unavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Converts into the serializable payload.
    pub fn into_error_info(self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        let (message, details) = match self {
            AppError::Validation { message, details }
            | AppError::Unauthorized { message, details }
            | AppError::Forbidden { message, details }
            | AppError::NotFound { message, details }
            | AppError::Conflict { message, details }
            | AppError::Unavailable { message, details }
            | AppError::Internal { message, details } => (message, details),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        let body = ErrorBody {
            error: self.into_error_info(),
        };

        if status == StatusCode::UNAUTHORIZED {
            // RFC 6750
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response();
        }

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::bad_request("Validation failed", json!(errors))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

/// Maps a driver error onto the HTTP taxonomy.
///
/// Unique violations become [`AppError::Conflict`], foreign key violations
/// [`AppError::Forbidden`] (the referenced owner does not exist), and pool or
/// connection failures [`AppError::Unavailable`].
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
        if db.is_foreign_key_violation() {
            return AppError::forbidden(
                "Referenced record does not exist",
                json!({ "constraint": db.constraint() }),
            );
        }
    }

    AppError::from(StoreError::from(e))
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::not_found("Record not found", json!({})),
            StoreError::Conflict(_) => AppError::conflict(
                "Concurrent update conflict, retry the request",
                json!({ "retryable": true }),
            ),
            StoreError::Unavailable(ref reason) => {
                tracing::error!(error = %reason, "Store unavailable");
                AppError::unavailable("Service temporarily unavailable", json!({}))
            }
            StoreError::Constraint(ref reason) => {
                tracing::warn!(error = %reason, "Constraint violation");
                AppError::bad_request("Constraint violation", json!({}))
            }
            StoreError::Internal(ref reason) => {
                tracing::error!(error = %reason, "Store error");
                AppError::internal("Database error", json!({}))
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidToken => {
                AppError::unauthorized("Unauthorized", json!({ "reason": "Invalid token" }))
            }
            TokenError::ExpiredToken => {
                AppError::unauthorized("Unauthorized", json!({ "reason": "Token has expired" }))
            }
            other => {
                tracing::error!(error = %other, "Token issuance failed");
                AppError::internal("Failed to create access token", json!({}))
            }
        }
    }
}

impl From<TransferError> for AppError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::InvalidAmount(amount) => AppError::bad_request(
                "Transfer amount must be positive",
                json!({ "amount": amount }),
            ),
            TransferError::SameAccount(id) => AppError::bad_request(
                "Cannot transfer to the same account",
                json!({ "account_id": id }),
            ),
            TransferError::AccountNotFound(id) => {
                AppError::not_found("Account not found", json!({ "account_id": id }))
            }
            TransferError::CurrencyMismatch { from, to } => AppError::bad_request(
                "Currency mismatch",
                json!({ "from_currency": from, "to_currency": to }),
            ),
            TransferError::InsufficientFunds {
                account_id,
                balance,
                amount,
            } => AppError::bad_request(
                "Insufficient funds",
                json!({ "account_id": account_id, "balance": balance, "amount": amount }),
            ),
            TransferError::SerializationConflict => AppError::conflict(
                "Concurrent transfer conflict, retry the request",
                json!({ "retryable": true }),
            ),
            TransferError::StoreUnavailable => {
                AppError::unavailable("Service temporarily unavailable", json!({}))
            }
            TransferError::Store(reason) => {
                tracing::error!(error = %reason, "Transfer failed in store");
                AppError::internal("Database error", json!({}))
            }
        }
    }
}
