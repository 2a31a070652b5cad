//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`      - Health check: database (public)
//! - `POST /users`       - Registration (public)
//! - `POST /users/login` - Login (public, strict rate limit)
//! - `/accounts/*`       - Accounts (access token required)
//! - `/transfers/*`      - Transfers (access token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket
//! - **Authorization** - Bearer access token
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Per-IP rate limiting reads the peer socket address, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::layer());

    let public = api::routes::public_routes().layer(rate_limit::layer());

    let login = api::routes::login_routes().layer(rate_limit::login_layer());

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(public)
        .merge(login)
        .merge(protected)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
