//! Business services for the storefront.
//!
//! - `ordering` - the order placement transaction
//! - `notifications` - Telegram messages to staff

pub mod notifications;
pub mod ordering;
