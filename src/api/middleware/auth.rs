//! Bearer token authorization middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState};

/// Authenticates requests using access tokens from the Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Authorization Flow
///
/// 1. Extract the token from the `Authorization` header
/// 2. Verify it with the configured [`crate::token::TokenMaker`]
/// 3. Attach the verified [`crate::token::TokenPayload`] to the request
///    extensions
/// 4. Continue to next middleware/handler
///
/// Verification is stateless: no database access happens here. Ownership of
/// the requested resources is checked by the handlers.
///
/// # Errors
///
/// Returns `401 Unauthorized` if:
/// - Authorization header is missing
/// - Authorization scheme is not `Bearer` (matched case-insensitively)
/// - Token is malformed, tampered with, signed with another key, or expired
///
/// Adds `WWW-Authenticate: Bearer` header to 401 responses per RFC 6750.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::get, middleware};
/// use crate::api::middleware::auth;
///
/// let protected = Router::new()
///     .route("/accounts", get(list_accounts_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        AppError::unauthorized(
            "Unauthorized",
            serde_json::json!({"reason": "Authorization header is missing or invalid"}),
        )
    })?;

    let payload = st.token_maker.verify_token(token)?;

    req.extensions_mut().insert(payload);

    Ok(next.run(req).await)
}

/// Extracts the token from `Authorization: Bearer <token>`.
///
/// The scheme name is case-insensitive (RFC 9110 section 11.1).
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
