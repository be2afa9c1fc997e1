//! Request/response boundary tests

use rust_decimal::Decimal;
use serde_json::{json, Value};
use wallet_settlement::{Config, LeaderboardEntry, WalletRequest, WalletResponse, WalletService};

fn create_service() -> WalletService {
    let mut config = Config::in_memory();
    config
        .identity
        .tokens
        .insert("token-alice".to_string(), "u-alice".to_string());
    config
        .identity
        .tokens
        .insert("token-bob".to_string(), "u-bob".to_string());
    config.leaderboard.entries = vec![
        LeaderboardEntry {
            rank: 2,
            username: "GameMaster".to_string(),
            winnings: Decimal::from(12850),
            games_won: 72,
        },
        LeaderboardEntry {
            rank: 1,
            username: "CryptoKing".to_string(),
            winnings: Decimal::from(15420),
            games_won: 87,
        },
    ];
    WalletService::from_config(&config).unwrap()
}

async fn call(service: &WalletService, token: &str, request: Value) -> Value {
    let line = json!({ "token": token, "request": request }).to_string();
    let response = service.handle_line(&line).await;
    serde_json::to_value(&response).unwrap()
}

async fn open_both(service: &WalletService) {
    call(service, "token-alice", json!({"op": "open_account", "username": "alice"})).await;
    call(
        service,
        "token-bob",
        json!({"op": "open_account", "username": "bob", "email": "bob@example.com"}),
    )
    .await;
}

#[tokio::test]
async fn open_and_read_account() {
    let service = create_service();
    let opened = call(&service, "token-alice", json!({"op": "open_account", "username": "alice"})).await;

    assert_eq!(opened["userId"], "u-alice");
    assert_eq!(opened["username"], "alice");
    assert_eq!(opened["balance"], "1000");
    assert_eq!(opened["gamesPlayed"], 0);

    let account = call(&service, "token-alice", json!({"op": "get_account"})).await;
    assert_eq!(account, opened);

    let again = call(&service, "token-alice", json!({"op": "open_account", "username": "alice"})).await;
    assert_eq!(again["error"]["kind"], "account_exists");
}

#[tokio::test]
async fn transfer_between_users() {
    let service = create_service();
    open_both(&service).await;

    let sent = call(
        &service,
        "token-alice",
        json!({"op": "transfer", "recipient": "bob", "amount": "25.5", "note": "pizza"}),
    )
    .await;
    assert_eq!(sent["newBalance"], "974.5");
    assert_eq!(sent["recipientId"], "u-bob");
    assert_eq!(sent["transaction"]["type"], "sent");
    assert_eq!(sent["transaction"]["description"], "Sent to bob - pizza");

    let history = call(&service, "token-bob", json!({"op": "get_transactions"})).await;
    let transactions = history["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["type"], "received");
    assert_eq!(transactions[0]["balanceAfter"], "1025.5");
}

#[tokio::test]
async fn game_flow_through_boundary() {
    let service = create_service();
    open_both(&service).await;

    let escrow = call(
        &service,
        "token-alice",
        json!({"op": "escrow", "gameId": "g1", "gameLabel": "Arena", "entryFee": "50"}),
    )
    .await;
    assert_eq!(escrow["newBalance"], "950");
    assert_eq!(escrow["gameId"], "g1");

    let settled = call(
        &service,
        "token-alice",
        json!({
            "op": "settle",
            "gameId": "g1",
            "gameLabel": "Arena",
            "result": "win",
            "amount": "120",
            "opponent": "Bob",
            "duration": "5:30"
        }),
    )
    .await;
    assert_eq!(settled["newBalance"], "1070");
    assert_eq!(settled["gamingStats"]["gamesWon"], 1);
    assert_eq!(settled["transaction"]["game"]["opponent"], "Bob");

    let stats = call(&service, "token-alice", json!({"op": "get_statistics"})).await;
    assert_eq!(stats["gamingStats"], settled["gamingStats"]);

    let mismatch = call(
        &service,
        "token-alice",
        json!({
            "op": "settle",
            "gameId": "g2",
            "gameLabel": "Arena",
            "result": "win",
            "amount": "-10",
            "opponent": "Bob",
            "duration": "1:00"
        }),
    )
    .await;
    assert_eq!(mismatch["error"]["kind"], "invalid_outcome");
}

#[tokio::test]
async fn statistics_default_to_zero() {
    let service = create_service();
    let stats = call(&service, "token-bob", json!({"op": "get_statistics"})).await;
    assert_eq!(stats["gamingStats"]["gamesWon"], 0);
    assert_eq!(stats["gamingStats"]["bestStreak"], 0);
}

#[tokio::test]
async fn leaderboard_is_served_in_rank_order() {
    let service = create_service();
    let board = call(&service, "token-bob", json!({"op": "get_leaderboard"})).await;
    let entries = board["leaderboard"].as_array().unwrap();
    assert_eq!(entries[0]["username"], "CryptoKing");
    assert_eq!(entries[1]["gamesWon"], 72);
}

#[tokio::test]
async fn rejections_are_reported() {
    let service = create_service();
    open_both(&service).await;

    let unauthorized = call(&service, "token-eve", json!({"op": "get_account"})).await;
    assert_eq!(unauthorized["error"]["kind"], "unauthorized");

    let unknown_op = call(&service, "token-alice", json!({"op": "mint_nft"})).await;
    assert_eq!(unknown_op["error"]["kind"], "invalid_request");

    let not_json = service.handle_line("transfer 10 to bob").await;
    assert!(not_json.is_error());

    let overdraft = call(
        &service,
        "token-alice",
        json!({"op": "credit_or_debit", "amount": "-1000.01", "type": "sent", "description": "x"}),
    )
    .await;
    assert_eq!(overdraft["error"]["kind"], "insufficient_balance");

    let unknown_recipient = call(
        &service,
        "token-alice",
        json!({"op": "transfer", "recipient": "0xabc", "amount": "5"}),
    )
    .await;
    assert_eq!(unknown_recipient["error"]["kind"], "not_found");

    let zero = call(
        &service,
        "token-alice",
        json!({"op": "transfer", "recipient": "bob", "amount": "0"}),
    )
    .await;
    assert_eq!(zero["error"]["kind"], "invalid_amount");
}

#[tokio::test]
async fn typed_requests_dispatch_directly() {
    let service = create_service();
    open_both(&service).await;

    let response = service
        .handle(
            "Bearer token-alice",
            WalletRequest::GetTransactions { limit: Some(0) },
        )
        .await;
    assert_eq!(
        response,
        WalletResponse::Transactions {
            transactions: Vec::new()
        }
    );
}

#[tokio::test]
async fn overflowing_amounts_are_rejected() {
    let service = create_service();
    open_both(&service).await;

    let credit = call(
        &service,
        "token-alice",
        json!({"op": "credit_or_debit", "amount": "79228162514264337593543950335", "type": "received", "description": "x"}),
    )
    .await;
    assert_eq!(credit["error"]["kind"], "invalid_amount");

    let settled = call(
        &service,
        "token-alice",
        json!({
            "op": "settle",
            "gameId": "g1",
            "gameLabel": "Arena",
            "result": "win",
            "amount": "79228162514264337593543950335",
            "opponent": "Bob",
            "duration": "1:00"
        }),
    )
    .await;
    assert_eq!(settled["error"]["kind"], "invalid_amount");

    let account = call(&service, "token-alice", json!({"op": "get_account"})).await;
    assert_eq!(account["balance"], "1000");
    assert_eq!(account["gamesPlayed"], 0);
}

#[tokio::test]
async fn metrics_render_as_prometheus_text() {
    let service = create_service();
    open_both(&service).await;
    call(
        &service,
        "token-alice",
        json!({"op": "transfer", "recipient": "bob", "amount": "5"}),
    )
    .await;

    let text = service.metrics().encode_text().unwrap();
    assert!(text.contains("wallet_transactions_total{type=\"sent\"} 1"));
    assert!(text.contains("wallet_operation_duration_seconds"));
}
