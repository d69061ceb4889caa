//! Raw `system_settings` rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use snacklane_core::settings::SettingType;

#[derive(Debug, Clone, Serialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub value_type: SettingType,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}
