//! HTTP route handlers for admin.
//!
//! Every `/api/admin` route authenticates staff with
//! `Authorization: tma <initData>`. Managers are limited to their own
//! clients and orders; routes marked (admin) require the `admin` role.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness
//! GET    /health/ready                         - Readiness (database)
//!
//! # Catalog
//! GET    /api/admin/products                   - Products (?category_id, search, is_active, skip, limit)
//! POST   /api/admin/products                   - Create a product
//! GET    /api/admin/products/{id}              - Product detail
//! PUT    /api/admin/products/{id}              - Update a product
//! DELETE /api/admin/products/{id}              - Deactivate a product
//! GET    /api/admin/categories                 - Categories
//! POST   /api/admin/categories                 - Create a category
//! PUT    /api/admin/categories/{id}            - Update a category
//!
//! # Clients
//! GET    /api/admin/clients                    - Clients (?status, search, skip, limit)
//! GET    /api/admin/clients/{id}               - Client detail
//! PUT    /api/admin/clients/{id}               - Update terms (admin)
//! POST   /api/admin/clients/{id}/approve       - Approve a pending client
//! POST   /api/admin/clients/{id}/block         - Block
//! POST   /api/admin/clients/{id}/unblock       - Unblock
//! POST   /api/admin/clients/{id}/payments      - Register a payment (admin)
//!
//! # Orders
//! GET    /api/admin/orders                     - Orders (?status, client_id, date_from, date_to, skip, limit)
//! GET    /api/admin/orders/{id}                - Order detail with history
//! PUT    /api/admin/orders/{id}/status         - Change status
//!
//! # Statistics
//! GET    /api/admin/stats/dashboard            - Headline figures
//! GET    /api/admin/stats/funnel               - Analytics events (?days)
//!
//! # Settings (admin)
//! GET    /api/admin/settings                   - All settings
//! PUT    /api/admin/settings/{key}             - Update a setting
//!
//! # Outreach
//! GET    /api/admin/outreach/stats             - Effectiveness (?days)
//! GET    /api/admin/outreach/messages          - Message log (?skip, limit)
//! GET    /api/admin/outreach/settings          - Scheduler settings (admin)
//! PUT    /api/admin/outreach/settings          - Update scheduler settings (admin)
//! POST   /api/admin/outreach/run               - Run expiry and outreach now (admin)
//! ```

pub mod catalog;
pub mod clients;
pub mod dashboard;
pub mod orders;
pub mod outreach;
pub mod settings;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// Largest page staff can request.
const MAX_LIMIT: i64 = 200;

/// Validate an optional page size against `1..=MAX_LIMIT`.
pub(crate) fn page_limit(value: Option<i64>, default: i64) -> Result<i64, AppError> {
    let limit = value.unwrap_or(default);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}

/// Validate an optional offset.
pub(crate) fn page_skip(value: Option<i64>) -> Result<i64, AppError> {
    let skip = value.unwrap_or(0);
    if skip < 0 {
        return Err(AppError::BadRequest("skip must not be negative".to_string()));
    }
    Ok(skip)
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route("/categories/{id}", put(catalog::update_category))
}

/// Create the client routes router.
pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(clients::list))
        .route("/{id}", get(clients::show).put(clients::update_terms))
        .route("/{id}/approve", post(clients::approve))
        .route("/{id}/block", post(clients::block))
        .route("/{id}/unblock", post(clients::unblock))
        .route("/{id}/payments", post(clients::register_payment))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
}

/// Create the outreach routes router.
pub fn outreach_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(outreach::stats))
        .route("/messages", get(outreach::messages))
        .route(
            "/settings",
            get(outreach::get_settings).put(outreach::update_settings),
        )
        .route("/run", post(outreach::run))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .nest("/clients", client_routes())
        .nest("/orders", order_routes())
        .nest("/outreach", outreach_routes())
        .route("/stats/dashboard", get(dashboard::stats))
        .route("/stats/funnel", get(dashboard::funnel))
        .route("/settings", get(settings::list))
        .route("/settings/{key}", put(settings::update));

    Router::new().nest("/api/admin", api)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::FixedOffset;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AdminConfig, TelegramConfig};

    /// State backed by a lazy pool; requests rejected before any query never
    /// touch the database.
    fn offline_state() -> AppState {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/snacklane_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            telegram: TelegramConfig {
                bot_token: SecretString::from("1:token"),
                api_base: snacklane_telegram::DEFAULT_API_BASE.to_string(),
                admin_ids: Vec::new(),
            },
            init_data_max_age: Duration::from_secs(86_400),
            outreach_enabled: false,
            shop_offset: FixedOffset::east_opt(5 * 3600).unwrap(),
            cors_allowed_origin: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/snacklane_test").unwrap();
        AppState::new(config, pool).unwrap()
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        routes()
            .with_state(offline_state())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_api_requires_authorization() {
        for uri in [
            "/api/admin/products",
            "/api/admin/clients",
            "/api/admin/orders",
            "/api/admin/stats/dashboard",
            "/api/admin/settings",
            "/api/admin/outreach/settings",
        ] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_forged_init_data_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/admin/outreach/run")
            .header("authorization", "tma user=%7B%22id%22%3A1%7D&auth_date=1&hash=00")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_storefront_paths_are_not_served() {
        let request = Request::builder()
            .uri("/api/cart")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_page_limit() {
        assert_eq!(page_limit(None, 50).ok(), Some(50));
        assert_eq!(page_limit(Some(200), 50).ok(), Some(200));
        assert!(page_limit(Some(201), 50).is_err());
        assert!(page_limit(Some(0), 50).is_err());
    }
}
