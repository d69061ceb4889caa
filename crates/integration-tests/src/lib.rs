//! Integration tests for Snacklane.
//!
//! # Running Tests
//!
//! ```bash
//! # Domain flow tests (no services needed)
//! cargo test -p snacklane-integration-tests
//!
//! # Live-server tests: start Postgres, run `snl migrate`, start both
//! # servers with the same TELEGRAM_BOT_TOKEN, then
//! cargo test -p snacklane-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` (default `http://localhost:3000`)
//! - `ADMIN_BASE_URL` (default `http://localhost:3001`)
//! - `TELEGRAM_BOT_TOKEN` - Used to sign `initData` for test users
//! - `TEST_ADMIN_TELEGRAM_ID` - A user created with `snl staff add -r admin`

use snacklane_telegram::{AUTH_SCHEME, sign_init_data};

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin API.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Bot token shared with the servers under test.
#[must_use]
pub fn bot_token() -> String {
    std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default()
}

/// Build an `Authorization` header value for a Telegram user, signed now.
#[must_use]
pub fn auth_header(telegram_id: i64, username: &str, bot_token: &str) -> String {
    let user = serde_json::json!({
        "id": telegram_id,
        "username": username,
        "first_name": "Test",
    })
    .to_string();
    let auth_date = chrono::Utc::now().timestamp().to_string();

    let init_data = sign_init_data(&[("auth_date", &auth_date), ("user", &user)], bot_token);
    format!("{AUTH_SCHEME} {init_data}")
}

/// A Telegram id unlikely to collide with real users.
#[must_use]
pub fn random_telegram_id() -> i64 {
    let nanos = chrono::Utc::now().timestamp_subsec_nanos();
    9_000_000_000 + i64::from(nanos % 1_000_000_000)
}
