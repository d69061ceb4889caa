//! Snacklane Storefront library.
//!
//! JSON API behind the Telegram mini-app. Exposed as a library so the
//! binary and the integration tests share the same router and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
