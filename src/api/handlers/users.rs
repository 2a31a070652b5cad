//! Handlers for user registration and login.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::user::{CreateUserRequest, LoginUserRequest, LoginUserResponse, UserResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Registers a new user.
///
/// # Endpoint
///
/// `POST /users`
///
/// # Request Body
///
/// ```json
/// {
///   "username": "alice",
///   "password": "secret",
///   "full_name": "Alice Liddell",
///   "email": "alice@example.com"
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request if validation fails
/// - 409 Conflict if the username or email is taken
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    let user = state
        .user_service
        .create_user(
            payload.username,
            payload.password,
            payload.full_name,
            payload.email,
        )
        .await?;

    Ok(Json(user.into()))
}

/// Exchanges credentials for an access token.
///
/// # Endpoint
///
/// `POST /users/login`
///
/// # Response
///
/// ```json
/// {
///   "access_token": "v2.local....",
///   "access_token_expires_at": "2024-01-01T00:15:00Z",
///   "user": { "username": "alice", ... }
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request if validation fails
/// - 404 Not Found if the user does not exist
/// - 401 Unauthorized if the password is wrong
pub async fn login_user_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginUserRequest>,
) -> Result<Json<LoginUserResponse>, AppError> {
    payload.validate()?;

    let outcome = state
        .user_service
        .login(&payload.username, payload.password)
        .await?;

    Ok(Json(outcome.into()))
}
