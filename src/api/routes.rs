//! API route configuration.
//!
//! Account and transfer endpoints require an access token via
//! [`crate::api::middleware::auth`]. Registration and login are public.

use crate::api::handlers::{
    create_account_handler, create_transfer_handler, create_user_handler, get_account_handler,
    get_transfer_handler, list_accounts_handler, list_entries_handler, login_user_handler,
};
use crate::api::middleware::auth;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Routes open to anonymous callers.
///
/// # Endpoints
///
/// - `POST /users` - Register a user
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/users", post(create_user_handler))
}

/// Credential check, kept apart so it can carry a stricter rate limit.
///
/// # Endpoints
///
/// - `POST /users/login` - Exchange credentials for an access token
pub fn login_routes() -> Router<AppState> {
    Router::new().route("/users/login", post(login_user_handler))
}

/// Routes acting on the caller's money. Wrap with [`auth::layer`].
///
/// # Endpoints
///
/// - `POST /accounts`              - Open an account
/// - `GET  /accounts`              - List own accounts (paginated)
/// - `GET  /accounts/{id}`         - Get an own account
/// - `GET  /accounts/{id}/entries` - Ledger entries of an own account (paginated)
/// - `POST /transfers`             - Transfer money from an own account
/// - `GET  /transfers/{id}`        - Get a transfer touching an own account
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts",
            post(create_account_handler).get(list_accounts_handler),
        )
        .route("/accounts/{id}", get(get_account_handler))
        .route("/accounts/{id}/entries", get(list_entries_handler))
        .route("/transfers", post(create_transfer_handler))
        .route("/transfers/{id}", get(get_transfer_handler))
}

/// Every API route with authorization applied and no rate limiting.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(login_routes())
        .merge(
            protected_routes().route_layer(middleware::from_fn_with_state(state, auth::layer)),
        )
}
