//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. CORS (mini-app origin)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Rate limiting (governor) on registration and order placement
//!
//! Authentication is not a layer: handlers take the [`TelegramAuth`],
//! [`CurrentUser`] or [`ActiveClient`] extractor they need.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{ActiveClient, CurrentUser, TelegramAuth};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
