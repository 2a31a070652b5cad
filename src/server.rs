//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, migrations, service wiring, and Axum server
//! lifecycle.

use crate::application::services::{AccountService, TransferService, UserService};
use crate::config::Config;
use crate::domain::repositories::{AccountRepository, LedgerStore, UserRepository};
use crate::infrastructure::persistence::{PgAccountRepository, PgLedgerStore, PgUserRepository};
use crate::routes::app_router;
use crate::state::AppState;
use crate::token::{PasetoMaker, TokenMaker};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Connection attempts before startup gives up.
const CONNECT_ATTEMPTS: usize = 5;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool (retried with exponential backoff)
/// - Apply migrations
/// - Token maker from the symmetric key
/// - Services and Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The token key is invalid
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let state = build_state(&config, Arc::new(pool))?;

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");

    Ok(())
}

/// Opens the connection pool, retrying while the database comes up.
async fn connect(config: &Config) -> Result<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime));

    // 500ms, 1s, 2s, 4s
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(250)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(CONNECT_ATTEMPTS - 1);

    Retry::spawn(strategy, || {
        let options = options.clone();
        async move {
            options
                .connect(&config.database_url)
                .await
                .inspect_err(|e| tracing::warn!(error = %e, "Database connection failed"))
        }
    })
    .await
    .context("Failed to connect to database")
}

/// Wires repositories, the token maker and services into [`AppState`].
///
/// # Errors
///
/// Returns an error if the token key is not exactly 32 bytes.
pub fn build_state(config: &Config, pool: Arc<PgPool>) -> Result<AppState> {
    let token_maker: Arc<dyn TokenMaker> = Arc::new(
        PasetoMaker::new(config.token_symmetric_key.as_bytes())
            .context("Invalid TOKEN_SYMMETRIC_KEY")?,
    );

    let user_repository: Arc<dyn UserRepository> =
        Arc::new(PgUserRepository::new(pool.clone()));
    let account_repository: Arc<dyn AccountRepository> =
        Arc::new(PgAccountRepository::new(pool.clone()));
    let ledger_store: Arc<dyn LedgerStore> =
        Arc::new(PgLedgerStore::new(pool, config.db_lock_timeout_ms));

    Ok(AppState {
        user_service: Arc::new(UserService::new(
            user_repository,
            token_maker.clone(),
            config.access_token_duration(),
        )),
        account_service: Arc::new(AccountService::new(account_repository)),
        transfer_service: Arc::new(TransferService::with_overdraft_policy(
            ledger_store,
            config.overdraft_policy(),
        )),
        token_maker,
    })
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
