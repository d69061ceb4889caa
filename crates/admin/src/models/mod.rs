//! Domain models for admin.

pub mod catalog;
pub mod client;
pub mod dashboard;
pub mod order;
pub mod outreach;
pub mod setting;
pub mod staff;

pub use catalog::{Category, Product};
pub use client::Client;
pub use dashboard::{DashboardStats, EventCount, FunnelStats};
pub use order::{Order, OrderHistoryEntry, OrderItem};
pub use outreach::{ClientSnapshot, OutreachMessage, OutreachSettings, OutreachStats};
pub use setting::SystemSetting;
pub use staff::Staff;
