//! Core types for Snacklane.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod bin;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use bin::{BinIin, BinIinError};
pub use id::*;
pub use money::{format_tenge, lenient_amount, percent_of, round_money};
pub use phone::{PhoneNumber, PhoneNumberError};
pub use status::*;
