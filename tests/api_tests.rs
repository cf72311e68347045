//! End-to-end API tests against a real Postgres at TEST_DATABASE_URL.
//! Run with `--features db-tests`.
#![cfg(feature = "db-tests")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::FakeReasoning;
use tradejournal::api::router::create_router;
use tradejournal::models::{Role, User};
use tradejournal::reasoning::ReasoningService;

const PASSWORD: &str = "correct horse";

async fn build_test_app(reasoning: Option<Arc<dyn ReasoningService>>) -> (axum::Router, sqlx::PgPool) {
    let pool = common::setup_test_db().await;
    let router = create_router(common::test_state(pool.clone(), reasoning));
    (router, pool)
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn login(app: &axum::Router, user: &User) -> String {
    let form = format!("username={}&password=correct+horse", user.username);
    let (status, json) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    assert_eq!(json["token_type"], "bearer");
    json["access_token"].as_str().unwrap().to_string()
}

fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn trade_body(pnl: &str) -> Value {
    json!({
        "date": "2024-03-01",
        "pair": "EURUSD",
        "system": "breakout",
        "action": "buy",
        "risk": "low",
        "risk_percent": "1",
        "lots": "0.5",
        "entry": "1.0850",
        "sl1_pips": "20",
        "tp1_pips": "40",
        "sl2_pips": "0",
        "tp2_pips": "0",
        "profit_or_loss": pnl,
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _pool) = build_test_app(None).await;

    let (status, json) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["reasoning"], "disabled");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "wrongpw", PASSWORD, Role::User).await;

    let (status, json) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={}&password=nope", user.username)))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Incorrect username or password");
}

#[tokio::test]
async fn test_me_hides_password_hash() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "me", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let (status, json) = send(&app, authed("GET", "/api/users/me", &token, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["username"], user.username.as_str());
    assert!(json["data"].get("hashed_password").is_none());
}

#[tokio::test]
async fn test_trade_lifecycle_and_report() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "trader", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let mut ids = Vec::new();
    for pnl in ["100", "-40", "60"] {
        let (status, json) =
            send(&app, authed("POST", "/api/trades", &token, Some(trade_body(pnl)))).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        ids.push(json["data"]["id"].as_str().unwrap().to_string());
    }

    // Cancel the 60 winner; it must drop out of the report but stay listed.
    let (status, json) =
        send(&app, authed("POST", &format!("/api/trades/{}/cancel", ids[2]), &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["cancelled"], true);

    let (_, json) = send(&app, authed("GET", "/api/trades", &token, None)).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let (_, json) =
        send(&app, authed("GET", "/api/trades?include_cancelled=false", &token, None)).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let (status, json) = send(&app, authed("GET", "/api/report", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    let report = &json["data"];
    assert_eq!(report["total_trades"], 2);
    assert_eq!(report["wins"], 1);
    assert_eq!(report["losses"], 1);
    assert_eq!(report["capital"], "1060");

    // Partial update keeps untouched fields.
    let (status, json) = send(
        &app,
        authed(
            "PUT",
            &format!("/api/trades/{}", ids[0]),
            &token,
            Some(json!({ "comments": "textbook setup" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["comments"], "textbook setup");
    assert_eq!(json["data"]["pair"], "EURUSD");

    // Cleared fields go back to empty.
    let (status, json) = send(
        &app,
        authed(
            "PUT",
            &format!("/api/trades/{}", ids[0]),
            &token,
            Some(json!({ "clear": ["comments", "tp2_pips"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["comments"].is_null());
    assert!(json["data"]["tp2_pips"].is_null());
    assert_eq!(json["data"]["pair"], "EURUSD");

    let (status, json) = send(
        &app,
        authed(
            "PUT",
            &format!("/api/trades/{}", ids[0]),
            &token,
            Some(json!({ "clear": ["cancelled"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "cancelled cannot be cleared");

    let (status, _) =
        send(&app, authed("DELETE", &format!("/api/trades/{}", ids[1]), &token, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        send(&app, authed("DELETE", &format!("/api/trades/{}", ids[1]), &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trades_are_scoped_to_owner() {
    let (app, pool) = build_test_app(None).await;
    let alice = common::seed_user(&pool, "alice", PASSWORD, Role::User).await;
    let bob = common::seed_user(&pool, "bob", PASSWORD, Role::User).await;
    let alice_token = login(&app, &alice).await;
    let bob_token = login(&app, &bob).await;

    let (_, json) =
        send(&app, authed("POST", "/api/trades", &alice_token, Some(trade_body("10")))).await;
    let id = json["data"]["id"].as_str().unwrap().to_string();

    let (status, _) =
        send(&app, authed("DELETE", &format!("/api/trades/{id}"), &bob_token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = send(&app, authed("GET", "/api/trades", &bob_token, None)).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_routes_refuse_regular_users() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "plain", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let (status, json) = send(&app, authed("GET", "/api/users", &token, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Not enough permissions");

    let (status, _) = send(
        &app,
        authed(
            "PUT",
            &format!("/api/users/{}", user.id),
            &token,
            Some(json!({ "role": "admin" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_users_and_rejects_duplicates() {
    let (app, pool) = build_test_app(None).await;
    let admin = common::seed_user(&pool, "admin", PASSWORD, Role::Admin).await;
    let token = login(&app, &admin).await;

    let username = format!("new_{}", uuid::Uuid::new_v4().simple());
    let body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "s3cret",
    });

    let (status, json) = send(&app, authed("POST", "/api/users", &token, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["role"], "user");
    assert_eq!(json["data"]["initial_capital"], "1000");

    let (status, json) = send(&app, authed("POST", "/api/users", &token, Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Username already exists");
}

#[tokio::test]
async fn test_blank_username_update_is_rejected() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "blankname", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let (status, json) = send(
        &app,
        authed(
            "PUT",
            &format!("/api/users/{}", user.id),
            &token,
            Some(json!({ "username": "   " })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "username must not be empty");

    // The account still logs in under its original name.
    login(&app, &user).await;
}

#[tokio::test]
async fn test_inactive_user_is_refused() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "inactive", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    sqlx::query("UPDATE users SET valid = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, json) = send(&app, authed("GET", "/api/users/me", &token, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Inactive user");
}

#[tokio::test]
async fn test_change_password() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "pwchange", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let (status, _) = send(
        &app,
        authed(
            "POST",
            "/api/users/me/change-password",
            &token,
            Some(json!({ "current_password": "wrong", "new_password": "next" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        authed(
            "POST",
            "/api/users/me/change-password",
            &token,
            Some(json!({ "current_password": PASSWORD, "new_password": "next" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_import_without_reasoning_service_is_bad_gateway() {
    let (app, pool) = build_test_app(None).await;
    let user = common::seed_user(&pool, "noai", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let (status, json) = send(&app, multipart_upload(&token, b"irrelevant")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_import_of_unreadable_file_is_bad_request() {
    let service = FakeReasoning::answering("{}");
    let (app, pool) = build_test_app(Some(service.clone())).await;
    let user = common::seed_user(&pool, "garbage", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let (status, _) = send(&app, multipart_upload(&token, b"definitely not a workbook")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_ask_forwards_question() {
    let service = FakeReasoning::answering("Cut your losers earlier.");
    let (app, pool) = build_test_app(Some(service.clone())).await;
    let user = common::seed_user(&pool, "asker", PASSWORD, Role::User).await;
    let token = login(&app, &user).await;

    let (status, json) = send(
        &app,
        authed("POST", "/api/ai/ask?question=How%20am%20I%20doing%3F", &token, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["answer"], "Cut your losers earlier.");
    assert_eq!(service.last_prompt().as_deref(), Some("How am I doing?"));
}

fn multipart_upload(token: &str, content: &[u8]) -> Request<Body> {
    const BOUNDARY: &str = "journal-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"trades.xlsx\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/trades/import")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
