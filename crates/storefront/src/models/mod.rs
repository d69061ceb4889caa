//! Domain models for storefront.
//!
//! These types are what handlers work with and what the API serializes;
//! database row types live next to their queries in `db`.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{CartLine, CartView, Category, Product, ProductWithPrice};
pub use order::{BonusTransaction, ClientStats, Order, OrderItem, TopProduct};
pub use user::{Client, User};
