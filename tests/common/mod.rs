#![allow(dead_code)]

use axum::{Router, routing::get};
use axum_test::TestServer;
use serde_json::json;
use simple_bank::api::handlers::health_handler;
use simple_bank::api::routes::api_routes;
use simple_bank::application::services::{
    AccountService, OverdraftPolicy, TransferService, UserService,
};
use simple_bank::domain::entities::{Account, NewAccount};
use simple_bank::domain::repositories::{
    AccountRepository, LedgerStore, UserRepository,
};
use simple_bank::infrastructure::memory::MemoryStore;
use simple_bank::infrastructure::persistence::{
    PgAccountRepository, PgLedgerStore, PgUserRepository,
};
use simple_bank::state::AppState;
use simple_bank::token::{PasetoMaker, TokenMaker};
use sqlx::PgPool;
use std::sync::Arc;

pub const TEST_KEY: &[u8] = b"12345678901234567890123456789012";
pub const TEST_PASSWORD: &str = "secret123";

pub fn token_maker() -> Arc<dyn TokenMaker> {
    Arc::new(PasetoMaker::new(TEST_KEY).unwrap())
}

/// State over a fresh in-process store.
pub fn create_memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let token_maker = token_maker();

    let user_repository: Arc<dyn UserRepository> = store.clone();
    let account_repository: Arc<dyn AccountRepository> = store.clone();
    let ledger_store: Arc<dyn LedgerStore> = store.clone();

    let state = AppState {
        user_service: Arc::new(UserService::new(
            user_repository,
            token_maker.clone(),
            chrono::Duration::minutes(15),
        )),
        account_service: Arc::new(AccountService::new(account_repository)),
        transfer_service: Arc::new(TransferService::with_overdraft_policy(
            ledger_store,
            OverdraftPolicy::Forbid,
        )),
        token_maker,
    };

    (state, store)
}

/// State over a PostgreSQL pool.
pub fn create_pg_state(pool: PgPool) -> AppState {
    let pool = Arc::new(pool);
    let token_maker = token_maker();

    let user_repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let account_repository: Arc<dyn AccountRepository> =
        Arc::new(PgAccountRepository::new(pool.clone()));
    let ledger_store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(pool, 5000));

    AppState {
        user_service: Arc::new(UserService::new(
            user_repository,
            token_maker.clone(),
            chrono::Duration::minutes(15),
        )),
        account_service: Arc::new(AccountService::new(account_repository)),
        transfer_service: Arc::new(TransferService::new(ledger_store)),
        token_maker,
    }
}

/// Every API route plus `/health`, without rate limiting.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(api_routes(state.clone()))
        .with_state(state)
}

pub fn create_server(state: AppState) -> TestServer {
    TestServer::new(create_app(state)).unwrap()
}

/// Registers a user through the API.
pub async fn register(server: &TestServer, username: &str) {
    server
        .post("/users")
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
            "full_name": format!("{username} tester"),
            "email": format!("{username}@example.com"),
        }))
        .await
        .assert_status_ok();
}

/// Logs in through the API and returns the access token.
pub async fn login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/users/login")
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;

    response.assert_status_ok();

    response.json::<serde_json::Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Mints a token without going through login.
pub fn token_for(username: &str) -> String {
    token_maker()
        .create_token(username, chrono::Duration::minutes(15))
        .unwrap()
        .0
}

/// Opens an account with a starting balance directly in the store.
pub async fn open_account(
    store: &MemoryStore,
    owner: &str,
    balance: i64,
    currency: &str,
) -> Account {
    store.seed_user(owner);
    AccountRepository::create(
        store,
        NewAccount {
            owner: owner.to_string(),
            balance,
            currency: currency.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn balance_of(store: &MemoryStore, id: i64) -> i64 {
    store.find_by_id(id).await.unwrap().unwrap().balance
}

/// Inserts a user row for PostgreSQL tests.
pub async fn create_pg_user(pool: &PgPool, username: &str) {
    sqlx::query(
        "INSERT INTO users (username, hashed_password, full_name, email) VALUES ($1, 'x', $1, $2)",
    )
    .bind(username)
    .bind(format!("{username}@example.com"))
    .execute(pool)
    .await
    .unwrap();
}

/// Inserts an account row with a starting balance for PostgreSQL tests.
pub async fn create_pg_account(pool: &PgPool, owner: &str, balance: i64, currency: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO accounts (owner, balance, currency) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(owner)
    .bind(balance)
    .bind(currency)
    .fetch_one(pool)
    .await
    .unwrap()
}
