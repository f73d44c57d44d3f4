//! Integration tests for the HTTP endpoints

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use simtrade::config::Config;
use simtrade::{app, AppState};
use tower::ServiceExt;

fn trades_uri(mobile: &str) -> String {
    let query = serde_urlencoded::to_string([("mobile", mobile)]).unwrap();
    format!("/api/trades?{}", query)
}

fn post_trade(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn setup() -> (AppState, Router) {
    let state = AppState::new(Config::default());
    let router = app(state.clone());
    (state, router)
}

// =============================================================================
// GET /api/trades
// =============================================================================

#[tokio::test]
async fn test_get_unknown_user_creates_entry() {
    let (state, app) = setup();

    let (status, body) = send(&app, get(&trades_uri("9929999022"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["walletBalance"], 10_000.0);
    assert_eq!(body["portfolio"], json!({"shares": 0, "avgPrice": 0.0}));
    assert_eq!(body["tradeHistory"], json!([]));
    assert_eq!(body["globalHouseProfit"], 0.0);
    assert_eq!(state.ledger.len(), 1);
}

#[tokio::test]
async fn test_get_requires_mobile() {
    let (state, app) = setup();

    let (status, body) = send(&app, get("/api/trades")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Mobile number is required");
    assert!(state.ledger.is_empty());
}

// =============================================================================
// POST /api/trades
// =============================================================================

#[tokio::test]
async fn test_buy_then_sell_round() {
    let (state, app) = setup();
    let uri = trades_uri("9929999022");

    let (status, body) = send(
        &app,
        post_trade(&uri, json!({"type": "buy", "quantity": 10, "price": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["walletBalance"], 9000.0);
    assert_eq!(body["portfolio"]["shares"], 10);
    assert_eq!(body["portfolio"]["avgPrice"], 100.0);

    let (status, body) = send(
        &app,
        post_trade(&uri, json!({"type": "sell", "quantity": 5, "price": 120})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["walletBalance"], 9580.0);
    assert_eq!(body["portfolio"]["shares"], 5);
    assert_eq!(body["portfolio"]["avgPrice"], 100.0);
    assert_eq!(body["globalHouseProfit"], 20.0);

    let history = body["tradeHistory"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["type"], "buy");
    assert!(history[0].get("profit").is_none());
    assert_eq!(history[1]["type"], "sell");
    assert_eq!(history[1]["profit"], 100.0);
    assert!(history[1]["timestamp"].is_string());

    assert_eq!(state.market.snapshot().total_buy_value, 1000.0);
}

#[tokio::test]
async fn test_house_profit_is_global() {
    let (_, app) = setup();
    let alice = trades_uri("alice");

    send(&app, post_trade(&alice, json!({"type": "buy", "quantity": 10, "price": 100}))).await;
    send(&app, post_trade(&alice, json!({"type": "sell", "quantity": 10, "price": 110}))).await;

    let (_, body) = send(&app, get(&trades_uri("bob"))).await;
    assert_eq!(body["walletBalance"], 10_000.0);
    assert_eq!(body["globalHouseProfit"], 20.0);
}

#[tokio::test]
async fn test_insufficient_funds() {
    let (_, app) = setup();
    let uri = trades_uri("u1");

    let (status, body) = send(
        &app,
        post_trade(&uri, json!({"type": "buy", "quantity": 101, "price": 100})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Insufficient funds"));

    let (_, body) = send(&app, get(&uri)).await;
    assert_eq!(body["walletBalance"], 10_000.0);
    assert_eq!(body["tradeHistory"], json!([]));
}

#[tokio::test]
async fn test_insufficient_shares() {
    let (_, app) = setup();

    let (status, body) = send(
        &app,
        post_trade(&trades_uri("u1"), json!({"type": "sell", "quantity": 1, "price": 100})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Insufficient shares"));
}

#[tokio::test]
async fn test_post_requires_mobile() {
    let (_, app) = setup();

    let (status, body) = send(
        &app,
        post_trade("/api/trades", json!({"type": "buy", "quantity": 1, "price": 100})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Mobile number is required");
}

#[tokio::test]
async fn test_invalid_bodies_are_bad_requests() {
    let (state, app) = setup();
    let uri = trades_uri("u1");

    let bodies = [
        json!({"type": "hold", "quantity": 1, "price": 100}),
        json!({"type": "buy", "quantity": -3, "price": 100}),
        json!({"type": "buy", "quantity": 1.5, "price": 100}),
        json!({"type": "buy", "quantity": 0, "price": 100}),
        json!({"type": "buy", "quantity": 1, "price": 0}),
        json!({"type": "buy", "quantity": 1}),
    ];

    for body in bodies {
        let (status, response) = send(&app, post_trade(&uri, body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response["success"], false);
        assert!(response["error"].is_string());
    }

    assert!(state.ledger.get_or_create("u1").trade_history.is_empty());
}

#[tokio::test]
async fn test_out_of_range_sell_keeps_wallet_numeric() {
    let (state, app) = setup();
    let uri = trades_uri("u1");
    let quantity = 10_000_000_000_000_000_000u64;

    let (status, _) = send(
        &app,
        post_trade(&uri, json!({"type": "buy", "quantity": quantity, "price": 1e-300})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_trade(&uri, json!({"type": "sell", "quantity": quantity, "price": 1e300})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, get(&uri)).await;
    assert!(body["walletBalance"].is_number());
    assert_eq!(body["portfolio"]["shares"], quantity);
    assert_eq!(state.market.snapshot().total_sell_value, 0.0);
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let (_, app) = setup();
    let request = Request::builder()
        .method(Method::POST)
        .uri(trades_uri("u1"))
        .body(Body::from(r#"{"type":"buy","quantity":1,"price":100}"#))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Market and health
// =============================================================================

#[tokio::test]
async fn test_market_stats_reflect_trades() {
    let (_, app) = setup();
    send(
        &app,
        post_trade(&trades_uri("u1"), json!({"type": "buy", "quantity": 2, "price": 50})),
    )
    .await;

    let (status, body) = send(&app, get("/api/market")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["lastPrice"], 100.0);
    assert_eq!(data["trend"], 0.0);
    assert_eq!(data["totalBuyValue"], 100.0);
    assert_eq!(data["totalSellValue"], 0.0);
    assert_eq!(data["globalHouseProfit"], 0.0);
    assert_eq!(data["activeStreams"], 0);
}

#[tokio::test]
async fn test_health() {
    let (_, app) = setup();

    let (status, body) = send(&app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert_eq!(body["users"], 0);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (_, app) = setup();
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
