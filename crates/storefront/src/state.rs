//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use snacklane_core::settings::ShopSettings;
use snacklane_telegram::{BotClient, TelegramError};

use crate::config::StorefrontConfig;
use crate::db::{RepositoryError, settings};

const SETTINGS_TTL: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    bot: BotClient,
    settings: Cache<(), Arc<ShopSettings>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Telegram HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, TelegramError> {
        let bot = BotClient::new(
            config.telegram.bot_token.clone(),
            &config.telegram.api_base,
        )?;
        let settings = Cache::builder()
            .max_capacity(1)
            .time_to_live(SETTINGS_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                bot,
                settings,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
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

    /// Current shop settings, cached for 30 seconds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the settings table cannot be read.
    pub async fn shop_settings(&self) -> Result<Arc<ShopSettings>, RepositoryError> {
        if let Some(cached) = self.inner.settings.get(&()).await {
            debug!("Cache hit for shop settings");
            return Ok(cached);
        }

        let loaded = Arc::new(settings::load_shop_settings(&self.inner.pool).await?);
        self.inner.settings.insert((), Arc::clone(&loaded)).await;
        Ok(loaded)
    }
}
