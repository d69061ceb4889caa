//! Live tests against a running admin server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`snl migrate`, `snl seed settings`)
//! - The admin server running (`cargo run -p snacklane-admin`)
//! - `TELEGRAM_BOT_TOKEN` matching the server's
//! - `TEST_ADMIN_TELEGRAM_ID` of a user added with `snl staff add -r admin`
//!
//! Run with: cargo test -p snacklane-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use snacklane_integration_tests::{admin_base_url, auth_header, bot_token, random_telegram_id};

fn admin_auth() -> String {
    let telegram_id = std::env::var("TEST_ADMIN_TELEGRAM_ID")
        .expect("TEST_ADMIN_TELEGRAM_ID not set")
        .parse()
        .expect("TEST_ADMIN_TELEGRAM_ID must be a number");
    auth_header(telegram_id, "test_admin", &bot_token())
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server and TELEGRAM_BOT_TOKEN"]
async fn test_unknown_user_is_not_staff() {
    let resp = Client::new()
        .get(format!("{}/api/admin/stats/dashboard", admin_base_url()))
        .header(
            "Authorization",
            auth_header(random_telegram_id(), "stranger", &bot_token()),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and an admin user"]
async fn test_dashboard_stats() {
    let resp = Client::new()
        .get(format!("{}/api/admin/stats/dashboard", admin_base_url()))
        .header("Authorization", admin_auth())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("pending_clients").is_some());
}

#[tokio::test]
#[ignore = "Requires running admin server and an admin user"]
async fn test_setting_update_is_validated() {
    let client = Client::new();
    let base_url = admin_base_url();

    let resp = client
        .put(format!("{base_url}/api/admin/settings/min_order_amount"))
        .header("Authorization", admin_auth())
        .json(&json!({ "value": "not a number" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .put(format!("{base_url}/api/admin/settings/no_such_key"))
        .header("Authorization", admin_auth())
        .json(&json!({ "value": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and an admin user"]
async fn test_order_status_cannot_move_backwards() {
    let client = Client::new();
    let base_url = admin_base_url();

    let orders: Value = client
        .get(format!("{base_url}/api/admin/orders?status=delivered&limit=1"))
        .header("Authorization", admin_auth())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let Some(order_id) = orders["orders"][0]["id"].as_i64() else {
        return;
    };

    let resp = client
        .put(format!("{base_url}/api/admin/orders/{order_id}/status"))
        .header("Authorization", admin_auth())
        .json(&json!({ "status": "new" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
