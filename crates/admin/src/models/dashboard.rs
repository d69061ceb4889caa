//! Dashboard and funnel figures.

use rust_decimal::Decimal;
use serde::Serialize;

/// Headline numbers for the dashboard.
///
/// Revenue is the sum of `final_total` over orders that were not cancelled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub today_orders: i64,
    pub today_revenue: Decimal,
    pub week_orders: i64,
    pub week_revenue: Decimal,
    pub pending_clients: i64,
    pub low_stock_products: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventCount {
    pub event_type: String,
    pub count: i64,
}

/// Analytics event counts over a period.
#[derive(Debug, Clone, Serialize)]
pub struct FunnelStats {
    pub period_days: i32,
    pub events: Vec<EventCount>,
}
