//! Handler for the health endpoint.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Duration;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Subject of the self-check token. Never a valid username: usernames are
/// alphanumeric.
const SELF_CHECK_SUBJECT: &str = "health-check";

/// Reports whether the service can serve requests.
///
/// # Endpoint
///
/// `GET /health` (no token required)
///
/// # Response Codes
///
/// - **200 OK**: store and token key both usable
/// - **503 Service Unavailable**: at least one check failed
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "tokens": { "status": "ok", "message": "Key usable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let checks = HealthChecks {
        database: check_database(&state).await,
        tokens: check_tokens(&state),
    };

    let healthy = checks.database.is_ok() && checks.tokens.is_ok();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        checks,
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.transfer_service.health_check().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => {
            tracing::warn!(error = %e, "Ledger store ping failed");
            CheckStatus::error("Database unavailable")
        }
    }
}

/// Seals a short-lived self-check token and opens it again.
fn check_tokens(state: &AppState) -> CheckStatus {
    let round_trip = state
        .token_maker
        .create_token(SELF_CHECK_SUBJECT, Duration::seconds(30))
        .and_then(|(token, _)| state.token_maker.verify_token(&token));

    match round_trip {
        Ok(payload) if payload.username == SELF_CHECK_SUBJECT => CheckStatus::ok("Key usable"),
        Ok(_) => CheckStatus::error("Token payload mismatch"),
        Err(e) => {
            tracing::error!(error = %e, "Token self-check failed");
            CheckStatus::error("Token key unusable")
        }
    }
}
