//! Mini-app `initData` verification.
//!
//! Telegram signs the launch parameters of a Web App with a key derived from
//! the bot token:
//!
//! ```text
//! secret_key       = HMAC_SHA256(key = "WebAppData", msg = bot_token)
//! data_check_string = sorted "key=value" pairs except `hash`, joined by '\n'
//! hash             = hex(HMAC_SHA256(key = secret_key, msg = data_check_string))
//! ```
//!
//! See <https://core.telegram.org/bots/webapps#validating-data-received-via-the-mini-app>.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use snacklane_core::TelegramId;

use super::error::InitDataError;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_KEY: &[u8] = b"WebAppData";

/// Authorization scheme used by Telegram mini-apps.
pub const AUTH_SCHEME: &str = "tma";

/// Strip the optional `tma ` scheme from an `Authorization` header value.
#[must_use]
pub fn init_data_from_header(value: &str) -> &str {
    let value = value.trim();
    value
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(AUTH_SCHEME))
        .map_or(value, |(_, rest)| rest.trim_start())
}

/// The Telegram user who opened the mini-app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppUser {
    pub id: TelegramId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Verified launch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    pub user: WebAppUser,
    pub auth_date: DateTime<Utc>,
    pub query_id: Option<String>,
}

fn parse_pairs(raw: &str) -> BTreeMap<String, String> {
    raw.split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let value = urlencoding::decode(value).ok()?;
            Some((key.to_owned(), value.into_owned()))
        })
        .collect()
}

fn secret_key(bot_token: &str) -> Result<HmacSha256, InitDataError> {
    let mut key_mac =
        HmacSha256::new_from_slice(WEB_APP_KEY).map_err(|_| InitDataError::InvalidSignature)?;
    key_mac.update(bot_token.as_bytes());
    let secret = key_mac.finalize().into_bytes();
    HmacSha256::new_from_slice(&secret).map_err(|_| InitDataError::InvalidSignature)
}

fn data_check_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, _)| key.as_str() != "hash")
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Verify `initData` and extract the user.
///
/// # Arguments
///
/// * `raw` - The query-string formatted `initData`
/// * `bot_token` - Token of the bot that launched the mini-app
/// * `max_age` - Reject data whose `auth_date` is older than this
/// * `now` - Current time
///
/// # Errors
///
/// Returns an [`InitDataError`] when the signature does not match, the data
/// is stale, or the user payload is missing or malformed.
pub fn verify_init_data(
    raw: &str,
    bot_token: &str,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<InitData, InitDataError> {
    let params = parse_pairs(raw);

    let received = params.get("hash").ok_or(InitDataError::MissingHash)?;
    let received = hex::decode(received).map_err(|_| InitDataError::InvalidSignature)?;

    let mut mac = secret_key(bot_token)?;
    mac.update(data_check_string(&params).as_bytes());
    mac.verify_slice(&received)
        .map_err(|_| InitDataError::InvalidSignature)?;

    let auth_date = params
        .get("auth_date")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or(InitDataError::MissingAuthDate)?;

    let age_secs = (now - auth_date).num_seconds();
    let max_age_secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
    if age_secs > max_age_secs {
        return Err(InitDataError::Expired { age_secs });
    }

    let user_json = params.get("user").ok_or(InitDataError::MissingUser)?;
    let user: WebAppUser =
        serde_json::from_str(user_json).map_err(|e| InitDataError::InvalidUser(e.to_string()))?;

    Ok(InitData {
        user,
        auth_date,
        query_id: params.get("query_id").cloned(),
    })
}

/// Build a signed `initData` string the way Telegram does.
///
/// Used by local tooling and tests to call the APIs without a Telegram client.
#[must_use]
pub fn sign_init_data(pairs: &[(&str, &str)], bot_token: &str) -> String {
    let params: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();

    let hash = secret_key(bot_token).map_or_else(
        |_| String::new(),
        |mut mac| {
            mac.update(data_check_string(&params).as_bytes());
            hex::encode(mac.finalize().into_bytes())
        },
    );

    let mut encoded: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect();
    encoded.push(format!("hash={hash}"));
    encoded.join("&")
}
