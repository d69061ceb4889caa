//! Snacklane Admin library.
//!
//! Staff-facing JSON API and the background scheduler. Exposed as a library
//! so the binary and the integration tests share the same router and
//! services.
//!
//! # Roles
//!
//! - `manager`: clients and orders assigned to them, catalog, statistics
//! - `admin`: everything, including settings, commercial terms, payments
//!   and outreach configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
