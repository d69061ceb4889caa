//! Telegram integration for Snacklane.
//!
//! This crate provides:
//! - [`BotClient`] for sending chat messages through the Bot API
//! - [`verify_init_data`] for authenticating mini-app requests
//!
//! # Flow
//!
//! 1. The mini-app (or admin dashboard opened from Telegram) sends its signed
//!    `initData` in the `Authorization: tma <initData>` header
//! 2. The server verifies the HMAC signature with the bot token and checks
//!    `auth_date` freshness
//! 3. The verified Telegram user id is used to look up the local user

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod error;
mod init_data;

pub use client::{BotClient, DEFAULT_API_BASE, escape_html};
pub use error::{InitDataError, TelegramError};
pub use init_data::{
    AUTH_SCHEME, InitData, WebAppUser, init_data_from_header, sign_init_data, verify_init_data,
};
