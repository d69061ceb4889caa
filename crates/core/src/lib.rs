//! Snacklane Core - Shared domain library.
//!
//! This crate provides the types and business rules used across all Snacklane
//! components:
//! - `storefront` - Telegram mini-app API for business clients
//! - `admin` - Manager/admin API and the outreach scheduler
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides money (personal prices,
//! discounts, bonus caps, credit checks) lives here so both binaries agree.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money helpers, statuses, phone and BIN newtypes
//! - [`pricing`] - Order quoting (discounts, bonus redemption, credit limit)
//! - [`bonus`] - Bonus accrual and expiry arithmetic
//! - [`settings`] - Typed view over the `system_settings` key/value table
//! - [`tiers`] - Cart reward tier progress

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bonus;
pub mod pricing;
pub mod settings;
pub mod tiers;
pub mod types;

pub use types::*;
