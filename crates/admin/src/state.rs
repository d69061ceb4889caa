//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use snacklane_telegram::{BotClient, TelegramError};

use crate::config::AdminConfig;

/// Application state shared across all handlers and the scheduler.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    bot: BotClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Telegram HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, TelegramError> {
        let bot = BotClient::new(
            config.telegram.bot_token.clone(),
            &config.telegram.api_base,
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pool, bot }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Telegram bot client.
    #[must_use]
    pub fn bot(&self) -> &BotClient {
        &self.inner.bot
    }
}
