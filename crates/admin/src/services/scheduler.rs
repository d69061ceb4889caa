//! Background scheduler for bonus expiry and outreach.
//!
//! Wakes at the configured send time in the shop's time zone. Bonus expiry
//! runs every day; outreach only when enabled, on an allowed weekday that is
//! not an excluded date. Settings are re-read at least hourly so changes
//! made in the admin panel take effect without a restart.

use std::time::Duration;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use snacklane_core::format_tenge;

use crate::db::{OutreachRepository, RepositoryError};
use crate::models::OutreachSettings;
use crate::services::bonus_expiry::{self, ExpiryReport};
use crate::services::notifications;
use crate::services::outreach::{self, OutreachReport};
use crate::state::AppState;

/// Longest single sleep before settings are re-read.
const MAX_SLEEP: Duration = Duration::from_secs(60 * 60);

/// Pause after a failed settings read.
const RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

/// Midnight of `now`'s local day, in UTC.
#[must_use]
pub fn day_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    now.with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .map_or(now, |start| start.with_timezone(&Utc))
}

/// Whether outreach may send on a local date.
#[must_use]
pub fn is_send_day(settings: &OutreachSettings, date: NaiveDate) -> bool {
    let weekday = i16::try_from(date.weekday().number_from_monday()).unwrap_or_default();
    settings.send_days.contains(&weekday) && !settings.excluded_dates.contains(&date)
}

/// Next occurrence of the send time strictly after `now`.
#[must_use]
pub fn next_run(
    settings: &OutreachSettings,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let hour = u32::try_from(settings.send_hour).ok()?;
    let minute = u32::try_from(settings.send_minute).ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let today = now.with_timezone(&offset).date_naive();

    [today, today.checked_add_days(Days::new(1))?]
        .into_iter()
        .filter_map(|date| date.and_time(time).and_local_timezone(offset).single())
        .map(|at| at.with_timezone(&Utc))
        .find(|at| *at > now)
}

/// Outcome of one scheduled (or manual) run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunReport {
    pub expiry: ExpiryReport,
    /// `None` when outreach was skipped.
    pub outreach: Option<OutreachReport>,
}

/// Admin summary of a run, or `None` when nothing happened.
#[must_use]
pub fn summary_message(report: &RunReport) -> Option<String> {
    let mut lines = Vec::new();
    if report.expiry.clients_expired > 0 {
        lines.push(format!(
            "⏳ Сгорело бонусов: {} у {} клиентов",
            format_tenge(report.expiry.total_expired),
            report.expiry.clients_expired
        ));
    }
    if let Some(outreach) = report.outreach.filter(|o| o.candidates > 0) {
        lines.push(format!(
            "📨 Рассылка: отправлено {}, ошибок {}",
            outreach.sent, outreach.failed
        ));
    }
    if lines.is_empty() {
        return None;
    }
    Some(format!("<b>Ежедневная задача</b>\n\n{}", lines.join("\n")))
}

async fn report_to_admins(state: &AppState, report: &RunReport) {
    let Some(text) = summary_message(report) else {
        return;
    };
    for chat_id in notifications::admin_recipients(state).await {
        notifications::send(state, chat_id, &text).await;
    }
}

/// Run bonus expiry, then outreach when `with_outreach` is set.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if either job cannot start.
pub async fn run_once(state: &AppState, with_outreach: bool) -> Result<RunReport, RepositoryError> {
    let now = Utc::now();
    let expiry = bonus_expiry::run(state, now).await?;
    let outreach = if with_outreach {
        Some(outreach::run(state, now, state.config().shop_offset).await?)
    } else {
        None
    };
    Ok(RunReport { expiry, outreach })
}

/// Scheduler loop. Never returns.
pub async fn run(state: AppState) {
    let offset = state.config().shop_offset;
    info!(%offset, "Scheduler started");

    loop {
        let settings = match OutreachRepository::new(state.pool()).settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load outreach settings");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        let now = Utc::now();
        let Some(at) = next_run(&settings, offset, now) else {
            warn!(
                send_hour = settings.send_hour,
                send_minute = settings.send_minute,
                "Invalid send time, scheduler idle"
            );
            tokio::time::sleep(MAX_SLEEP).await;
            continue;
        };

        let wait = (at - now).to_std().unwrap_or_default();
        if wait > MAX_SLEEP {
            tokio::time::sleep(MAX_SLEEP).await;
            continue;
        }
        tokio::time::sleep(wait).await;

        // Settings may have changed while sleeping.
        let settings = OutreachRepository::new(state.pool())
            .settings()
            .await
            .unwrap_or(settings);
        let local_date = at.with_timezone(&offset).date_naive();
        let with_outreach = settings.enabled && is_send_day(&settings, local_date);

        match run_once(&state, with_outreach).await {
            Ok(report) => report_to_admins(&state, &report).await,
            Err(e) => error!(error = %e, "Scheduled run failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn settings() -> OutreachSettings {
        OutreachSettings {
            enabled: true,
            send_hour: 10,
            send_minute: 30,
            send_days: vec![1, 2, 3, 4, 5],
            trigger_days_no_order: 14,
            trigger_bonus_amount: rust_decimal::Decimal::from(1000),
            trigger_bonus_expiry_days: 7,
            max_messages_per_day: 10,
            min_days_between_messages: 3,
            excluded_dates: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    fn almaty() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600).unwrap_or_else(|| panic!("valid offset"))
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap_or_else(|| panic!("valid timestamp"))
    }

    #[test]
    fn test_next_run_later_today() {
        // 04:00 UTC is 09:00 in Almaty; the slot is 10:30 local = 05:30 UTC.
        let next = next_run(&settings(), almaty(), utc(2025, 3, 3, 4, 0));
        assert_eq!(next, Some(utc(2025, 3, 3, 5, 30)));
    }

    #[test]
    fn test_next_run_tomorrow_after_send_time() {
        let next = next_run(&settings(), almaty(), utc(2025, 3, 3, 5, 30));
        assert_eq!(next, Some(utc(2025, 3, 4, 5, 30)));
    }

    #[test]
    fn test_next_run_rejects_invalid_time() {
        let mut bad = settings();
        bad.send_hour = 25;
        assert_eq!(next_run(&bad, almaty(), utc(2025, 3, 3, 4, 0)), None);
    }

    #[test]
    fn test_send_days_and_excluded_dates() {
        let mut s = settings();
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap_or_default();
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap_or_default();
        assert!(is_send_day(&s, monday));
        assert!(!is_send_day(&s, saturday));

        s.excluded_dates.push(monday);
        assert!(!is_send_day(&s, monday));
    }

    #[test]
    fn test_summary_message() {
        assert_eq!(summary_message(&RunReport::default()), None);

        let report = RunReport {
            expiry: ExpiryReport {
                clients_checked: 4,
                clients_expired: 2,
                total_expired: rust_decimal::Decimal::from(7_500),
            },
            outreach: Some(OutreachReport {
                candidates: 3,
                sent: 2,
                failed: 1,
            }),
        };
        let text = summary_message(&report).unwrap_or_default();
        assert!(text.contains("Сгорело бонусов: 7,500₸ у 2 клиентов"));
        assert!(text.contains("отправлено 2, ошибок 1"));
    }

    #[test]
    fn test_day_start_uses_local_midnight() {
        // 20:00 UTC on March 3 is already March 4 in Almaty.
        let start = day_start(utc(2025, 3, 3, 20, 0), almaty());
        assert_eq!(start, utc(2025, 3, 3, 19, 0));
    }
}
