//! HTTP route handlers for storefront.
//!
//! Every `/api` route authenticates with `Authorization: tma <initData>`.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                   - Liveness
//! GET    /health/ready                             - Readiness (database)
//!
//! # Auth
//! GET    /api/auth/check                           - Registration status of the caller
//! POST   /api/auth/register                        - Register a client (rate limited)
//! GET    /api/auth/me                              - Profile of an active client
//!
//! # Catalog (active clients, personal prices)
//! GET    /api/catalog/categories                   - Active categories
//! GET    /api/catalog/products                     - Products (?category_id, search, skip, limit)
//! GET    /api/catalog/products/{id}                - Product detail
//! GET    /api/catalog/products/{id}/recommendations - Suggestions (?limit)
//!
//! # Cart
//! GET    /api/cart                                 - Cart with tier progress
//! POST   /api/cart                                 - Add a product
//! DELETE /api/cart                                 - Clear
//! PUT    /api/cart/{product_id}                    - Set quantity
//! DELETE /api/cart/{product_id}                    - Remove a product
//!
//! # Orders
//! GET    /api/orders                               - Order history (?status, skip, limit)
//! POST   /api/orders                               - Place an order (rate limited)
//! GET    /api/orders/{id}                          - Order detail
//! POST   /api/orders/{id}/repeat                   - Re-order the same items (rate limited)
//!
//! # Profile
//! GET    /api/bonuses                              - Bonus balance and ledger
//! GET    /api/stats                                - Purchase statistics
//! ```

pub mod auth;
pub mod bonuses;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod stats;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Validate an optional page size against `1..=max`.
pub(crate) fn page_limit(value: Option<i64>, default: i64, max: i64) -> Result<i64, AppError> {
    let limit = value.unwrap_or(default);
    if !(1..=max).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {max}"
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

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/check", get(auth::check))
        .route("/me", get(auth::me))
        .route(
            "/register",
            post(auth::register).route_layer(auth_rate_limiter()),
        )
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route(
            "/products/{id}/recommendations",
            get(catalog::recommendations),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route(
            "/{product_id}",
            put(cart::update).delete(cart::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(orders::list).merge(post(orders::create).route_layer(api_rate_limiter())),
        )
        .route("/{id}", get(orders::show))
        .route(
            "/{id}/repeat",
            post(orders::repeat).route_layer(api_rate_limiter()),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/catalog", catalog_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .route("/api/bonuses", get(bonuses::show))
        .route("/api/stats", get(stats::show))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{StorefrontConfig, TelegramConfig};

    /// State backed by a lazy pool; requests rejected before any query never
    /// touch the database.
    fn offline_state() -> AppState {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/snacklane_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            telegram: TelegramConfig {
                bot_token: SecretString::from("1:token"),
                api_base: snacklane_telegram::DEFAULT_API_BASE.to_string(),
                admin_ids: Vec::new(),
            },
            init_data_max_age: Duration::from_secs(86_400),
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
        for uri in ["/api/auth/check", "/api/catalog/products", "/api/cart", "/api/stats"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_forged_init_data_is_rejected() {
        let request = Request::builder()
            .uri("/api/orders")
            .header("authorization", "tma user=%7B%22id%22%3A1%7D&auth_date=1&hash=00")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/api/nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_page_limit() {
        assert_eq!(page_limit(None, 50, 100).ok(), Some(50));
        assert_eq!(page_limit(Some(100), 50, 100).ok(), Some(100));
        assert!(page_limit(Some(0), 50, 100).is_err());
        assert!(page_limit(Some(101), 50, 100).is_err());
    }

    #[test]
    fn test_page_skip() {
        assert_eq!(page_skip(None).ok(), Some(0));
        assert!(page_skip(Some(-1)).is_err());
    }
}
