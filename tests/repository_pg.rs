mod common;

use std::sync::Arc;
use std::time::Duration;

use simple_bank::AppError;
use simple_bank::application::services::{TransferError, TransferService};
use simple_bank::domain::entities::{NewAccount, NewUser};
use simple_bank::domain::repositories::{AccountRepository, LedgerStore, UserRepository};
use simple_bank::infrastructure::persistence::{
    PgAccountRepository, PgLedgerStore, PgUserRepository,
};
use sqlx::PgPool;
use tokio::task::JoinSet;

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        hashed_password: "$argon2id$stub".to_string(),
        full_name: format!("{username} tester"),
        email: email.to_string(),
    }
}

async fn balance(pool: &PgPool, id: i64) -> i64 {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
async fn test_user_create_and_find(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));

    let created = repo
        .create(new_user("alice", "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(created.username, "alice");

    let found = repo.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(found.email, "alice@example.com");
    assert!(repo.find_by_username("ghost").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_user_unique_constraints(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));

    repo.create(new_user("alice", "alice@example.com"))
        .await
        .unwrap();

    let same_name = repo.create(new_user("alice", "other@example.com")).await;
    assert!(matches!(same_name, Err(AppError::Conflict { .. })));

    let same_email = repo.create(new_user("bob", "alice@example.com")).await;
    assert!(matches!(same_email, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_account_create_list_and_constraints(pool: PgPool) {
    common::create_pg_user(&pool, "alice").await;
    let repo = PgAccountRepository::new(Arc::new(pool));

    for currency in ["USD", "EUR"] {
        repo.create(NewAccount {
            owner: "alice".to_string(),
            balance: 0,
            currency: currency.to_string(),
        })
        .await
        .unwrap();
    }

    let duplicate = repo
        .create(NewAccount {
            owner: "alice".to_string(),
            balance: 0,
            currency: "USD".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict { .. })));

    let orphan = repo
        .create(NewAccount {
            owner: "ghost".to_string(),
            balance: 0,
            currency: "USD".to_string(),
        })
        .await;
    assert!(matches!(orphan, Err(AppError::Forbidden { .. })));

    let accounts = repo.list_by_owner("alice", 5, 0).await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(accounts[0].id < accounts[1].id);
    assert!(repo.list_by_owner("alice", 5, 2).await.unwrap().is_empty());
}

#[sqlx::test]
async fn test_ledger_transfer_commits_atomically(pool: PgPool) {
    common::create_pg_user(&pool, "alice").await;
    common::create_pg_user(&pool, "bob").await;
    let a = common::create_pg_account(&pool, "alice", 100, "USD").await;
    let b = common::create_pg_account(&pool, "bob", 50, "USD").await;

    let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(Arc::new(pool.clone()), 5000));
    let service = TransferService::new(store);

    let outcome = service.execute_transfer(a, b, 30).await.unwrap();
    assert_eq!(outcome.from_account.balance, 70);
    assert_eq!(outcome.to_account.balance, 80);
    assert_eq!(outcome.from_entry.amount, -30);
    assert_eq!(outcome.to_entry.amount, 30);

    let err = service.execute_transfer(a, b, 1000).await.unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds { .. }));

    let transfers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers")
        .fetch_one(&pool)
        .await
        .unwrap();
    let entry_sum: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0)::BIGINT FROM entries")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(transfers, 1);
    assert_eq!(entry_sum, 0);
    assert_eq!(balance(&pool, a).await, 70);
    assert_eq!(balance(&pool, b).await, 80);
}

#[sqlx::test]
async fn test_ledger_concurrent_transfers_do_not_deadlock(pool: PgPool) {
    common::create_pg_user(&pool, "alice").await;
    common::create_pg_user(&pool, "bob").await;
    let a = common::create_pg_account(&pool, "alice", 100, "USD").await;
    let b = common::create_pg_account(&pool, "bob", 100, "USD").await;

    let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(Arc::new(pool.clone()), 5000));
    let service = Arc::new(TransferService::new(store));

    let mut tasks = JoinSet::new();
    for i in 0..10 {
        let service = service.clone();
        let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
        tasks.spawn(async move { service.execute_transfer(from, to, 1).await });
    }

    let results = tokio::time::timeout(Duration::from_secs(30), tasks.join_all())
        .await
        .expect("transfers deadlocked");
    for result in results {
        result.unwrap();
    }

    let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(balance(&pool, a).await, 100);
    assert_eq!(balance(&pool, b).await, 100);
    assert_eq!(entries, 20);
}
