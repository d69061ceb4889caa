//! Live tests against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`snl migrate`, `snl seed settings`)
//! - The storefront running (`cargo run -p snacklane-storefront`)
//! - `TELEGRAM_BOT_TOKEN` matching the server's
//!
//! Run with: cargo test -p snacklane-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use snacklane_integration_tests::{
    auth_header, bot_token, random_telegram_id, storefront_base_url,
};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_api_requires_init_data() {
    let resp = Client::new()
        .get(format!("{}/api/catalog/products", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[tokio::test]
#[ignore = "Requires running storefront server and TELEGRAM_BOT_TOKEN"]
async fn test_registration_leaves_client_pending() {
    let client = Client::new();
    let base_url = storefront_base_url();
    let telegram_id = random_telegram_id();
    let auth = auth_header(telegram_id, "new_shop", &bot_token());

    let check: Value = client
        .get(format!("{base_url}/api/auth/check"))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Failed to check registration")
        .json()
        .await
        .unwrap();
    assert_eq!(check["registered"], json!(false));

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .header("Authorization", &auth)
        .json(&json!({
            "company_name": "ТОО Тестовый магазин",
            "address": "Алматы, ул. Абая 1",
            "bin_iin": "123456789012",
            "phone": "+7 701 123 45 67",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert!(resp.status().is_success(), "register: {}", resp.status());

    // Pending clients cannot see prices yet
    let resp = client
        .get(format!("{base_url}/api/catalog/products"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Registering twice conflicts
    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .header("Authorization", &auth)
        .json(&json!({
            "company_name": "ТОО Тестовый магазин",
            "phone": "+77011234567",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
