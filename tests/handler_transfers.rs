mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_transfer_moves_money() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 100, "USD").await;
    let b = common::open_account(&store, "bob", 50, "USD").await;
    let server = common::create_server(state);

    let response = server
        .post("/transfers")
        .authorization_bearer(common::token_for("alice"))
        .json(&json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 30,
            "currency": "USD"
        }))
        .await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["transfer"]["amount"], 30);
    assert_eq!(json["transfer"]["from_account_id"], a.id);
    assert_eq!(json["transfer"]["to_account_id"], b.id);
    assert_eq!(json["from_entry"]["amount"], -30);
    assert_eq!(json["to_entry"]["amount"], 30);
    assert_eq!(json["from_account"]["balance"], 70);
    assert_eq!(json["to_account"]["balance"], 80);

    assert_eq!(common::balance_of(&store, a.id).await, 70);
    assert_eq!(common::balance_of(&store, b.id).await, 80);
    assert_eq!(store.transfer_count(), 1);
    assert_eq!(store.entry_count(), 2);
}

#[tokio::test]
async fn test_transfer_rejects_non_positive_amount() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 100, "USD").await;
    let b = common::open_account(&store, "bob", 50, "USD").await;
    let server = common::create_server(state);

    for amount in [0, -5] {
        let response = server
            .post("/transfers")
            .authorization_bearer(common::token_for("alice"))
            .json(&json!({
                "from_account_id": a.id,
                "to_account_id": b.id,
                "amount": amount,
                "currency": "USD"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    assert_eq!(store.transactions_started(), 0);
    assert_eq!(store.transfer_count(), 0);
    assert_eq!(common::balance_of(&store, a.id).await, 100);
}

#[tokio::test]
async fn test_transfer_currency_mismatch() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 100, "USD").await;
    let b = common::open_account(&store, "bob", 50, "EUR").await;
    let server = common::create_server(state);

    let response = server
        .post("/transfers")
        .authorization_bearer(common::token_for("alice"))
        .json(&json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 10,
            "currency": "USD"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["message"],
        "Currency mismatch"
    );

    assert_eq!(store.transfer_count(), 0);
    assert_eq!(store.entry_count(), 0);
    assert_eq!(common::balance_of(&store, a.id).await, 100);
    assert_eq!(common::balance_of(&store, b.id).await, 50);
}

#[tokio::test]
async fn test_transfer_from_foreign_account() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 100, "USD").await;
    let b = common::open_account(&store, "bob", 50, "USD").await;
    let server = common::create_server(state);

    let response = server
        .post("/transfers")
        .authorization_bearer(common::token_for("bob"))
        .json(&json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 10,
            "currency": "USD"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(store.transfer_count(), 0);
}

#[tokio::test]
async fn test_transfer_to_missing_account() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 100, "USD").await;
    let server = common::create_server(state);

    let response = server
        .post("/transfers")
        .authorization_bearer(common::token_for("alice"))
        .json(&json!({
            "from_account_id": a.id,
            "to_account_id": 9999,
            "amount": 10,
            "currency": "USD"
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(common::balance_of(&store, a.id).await, 100);
}

#[tokio::test]
async fn test_transfer_insufficient_funds() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 20, "USD").await;
    let b = common::open_account(&store, "bob", 0, "USD").await;
    let server = common::create_server(state);

    let response = server
        .post("/transfers")
        .authorization_bearer(common::token_for("alice"))
        .json(&json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 21,
            "currency": "USD"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["message"],
        "Insufficient funds"
    );
    assert_eq!(store.transfer_count(), 0);
    assert_eq!(common::balance_of(&store, a.id).await, 20);
}

#[tokio::test]
async fn test_transfer_requires_token() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 100, "USD").await;
    let b = common::open_account(&store, "bob", 50, "USD").await;
    let server = common::create_server(state);

    let response = server
        .post("/transfers")
        .json(&json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 10,
            "currency": "USD"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(store.transactions_started(), 0);
}

#[tokio::test]
async fn test_get_transfer_visibility() {
    let (state, store) = common::create_memory_state();
    let a = common::open_account(&store, "alice", 100, "USD").await;
    let b = common::open_account(&store, "bob", 50, "USD").await;
    let server = common::create_server(state);

    let created = server
        .post("/transfers")
        .authorization_bearer(common::token_for("alice"))
        .json(&json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 5,
            "currency": "USD"
        }))
        .await;
    created.assert_status_ok();
    let id = created.json::<serde_json::Value>()["transfer"]["id"]
        .as_i64()
        .unwrap();

    for user in ["alice", "bob"] {
        let response = server
            .get(&format!("/transfers/{id}"))
            .authorization_bearer(common::token_for(user))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["amount"], 5);
    }

    server
        .get(&format!("/transfers/{id}"))
        .authorization_bearer(common::token_for("mallory"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .get("/transfers/9999")
        .authorization_bearer(common::token_for("alice"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
