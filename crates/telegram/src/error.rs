//! Telegram-related errors.

use thiserror::Error;

/// Errors that can occur when calling the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("Telegram request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Telegram response error: {0}")]
    Response(String),

    /// Bot API returned `ok: false`.
    #[error("Telegram API error: {0}")]
    Api(String),

    /// Client could not be constructed.
    #[error("Telegram configuration error: {0}")]
    Config(String),
}

/// Errors that can occur when verifying mini-app `initData`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitDataError {
    #[error("initData is missing the hash parameter")]
    MissingHash,

    #[error("initData signature mismatch")]
    InvalidSignature,

    #[error("initData is missing auth_date")]
    MissingAuthDate,

    #[error("initData is too old ({age_secs} seconds)")]
    Expired { age_secs: i64 },

    #[error("initData is missing the user parameter")]
    MissingUser,

    #[error("invalid user payload: {0}")]
    InvalidUser(String),
}
