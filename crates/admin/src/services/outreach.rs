//! Proactive outreach.
//!
//! Candidate selection is a pure function over client snapshots so the
//! rules can be tested without a database. Sending goes through the bot one
//! message at a time with a pause in between.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use snacklane_core::format_tenge;
use snacklane_telegram::escape_html;

use crate::db::{OutreachRepository, RepositoryError};
use crate::models::{ClientSnapshot, OutreachSettings};
use crate::services::{notifications, scheduler};
use crate::state::AppState;

/// Pause between two sends.
pub const SEND_PAUSE: Duration = Duration::from_secs(2);

/// Why a client is contacted, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachReason {
    BonusExpiring,
    NoRecentOrder,
    BonusBalance,
}

impl OutreachReason {
    /// Value stored in `outreach_messages.reason`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BonusExpiring => "bonus_expiring",
            Self::NoRecentOrder => "no_recent_order",
            Self::BonusBalance => "bonus_balance",
        }
    }
}

/// A client selected for a message.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub client: ClientSnapshot,
    pub reason: OutreachReason,
}

fn days_since(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - at).num_days()
}

fn reason_for(
    client: &ClientSnapshot,
    settings: &OutreachSettings,
    now: DateTime<Utc>,
) -> Option<OutreachReason> {
    if client.expiring_bonus.min(client.bonus_balance) > Decimal::ZERO {
        return Some(OutreachReason::BonusExpiring);
    }

    let last_activity = client.last_order_at.or(client.approved_at);
    if last_activity
        .is_some_and(|at| days_since(at, now) >= i64::from(settings.trigger_days_no_order))
    {
        return Some(OutreachReason::NoRecentOrder);
    }

    if client.bonus_balance > Decimal::ZERO && client.bonus_balance >= settings.trigger_bonus_amount
    {
        return Some(OutreachReason::BonusBalance);
    }

    None
}

/// Pick the clients to message now.
///
/// Clients messaged within `min_days_between_messages` are skipped. The
/// result is ordered by reason priority and capped at what is left of the
/// daily limit after `sent_today`.
#[must_use]
pub fn select_candidates(
    clients: Vec<ClientSnapshot>,
    settings: &OutreachSettings,
    now: DateTime<Utc>,
    sent_today: i64,
) -> Vec<Candidate> {
    let remaining = (i64::from(settings.max_messages_per_day) - sent_today).max(0);
    let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
    if remaining == 0 {
        return Vec::new();
    }

    let min_gap = i64::from(settings.min_days_between_messages);
    let mut candidates: Vec<Candidate> = clients
        .into_iter()
        .filter(|c| {
            c.last_message_at
                .is_none_or(|at| days_since(at, now) >= min_gap)
        })
        .filter_map(|client| {
            reason_for(&client, settings, now).map(|reason| Candidate { client, reason })
        })
        .collect();

    candidates.sort_by_key(|c| c.reason);
    candidates.truncate(remaining);
    candidates
}

/// Message text for a candidate.
#[must_use]
pub fn message_text(candidate: &Candidate, settings: &OutreachSettings) -> String {
    let client = &candidate.client;
    let company = escape_html(&client.company_name);
    match candidate.reason {
        OutreachReason::BonusExpiring => format!(
            "⏳ {company}, у вас сгорают бонусы: {} в ближайшие {} дн.\n\n\
             Используйте их в следующем заказе!",
            format_tenge(client.expiring_bonus.min(client.bonus_balance)),
            settings.trigger_bonus_expiry_days,
        ),
        OutreachReason::NoRecentOrder => format!(
            "👋 {company}, давно не было заказов!\n\n\
             Загляните в каталог, мы обновили ассортимент."
        ),
        OutreachReason::BonusBalance => format!(
            "🎁 {company}, на вашем бонусном счете {}.\n\n\
             Оплатите бонусами часть следующего заказа!",
            format_tenge(client.bonus_balance),
        ),
    }
}

/// Outcome of one outreach run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutreachReport {
    pub candidates: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Select candidates and message them.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if settings or snapshots cannot be
/// read. Send and logging failures are counted and skipped.
#[instrument(skip(state))]
pub async fn run(
    state: &AppState,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<OutreachReport, RepositoryError> {
    let repo = OutreachRepository::new(state.pool());
    let settings = repo.settings().await?;
    let sent_today = repo.sent_since(scheduler::day_start(now, offset)).await?;
    let snapshots = repo
        .snapshots(now, settings.trigger_bonus_expiry_days)
        .await?;

    let candidates = select_candidates(snapshots, &settings, now, sent_today);
    let mut report = OutreachReport {
        candidates: candidates.len(),
        ..OutreachReport::default()
    };

    for (i, candidate) in candidates.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(SEND_PAUSE).await;
        }

        let text = message_text(candidate, &settings);
        if !notifications::send(state, candidate.client.telegram_id, &text).await {
            report.failed += 1;
            continue;
        }
        report.sent += 1;

        if let Err(e) = repo
            .record_message(candidate.client.client_id, candidate.reason.as_str(), &text)
            .await
        {
            warn!(client_id = %candidate.client.client_id, error = %e, "Failed to log outreach message");
        }
    }

    info!(
        candidates = report.candidates,
        sent = report.sent,
        failed = report.failed,
        "Outreach finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use snacklane_core::{ClientId, TelegramId};

    use super::*;

    fn settings() -> OutreachSettings {
        OutreachSettings {
            enabled: true,
            send_hour: 10,
            send_minute: 0,
            send_days: vec![1, 2, 3, 4, 5],
            trigger_days_no_order: 14,
            trigger_bonus_amount: Decimal::from(1000),
            trigger_bonus_expiry_days: 7,
            max_messages_per_day: 10,
            min_days_between_messages: 3,
            excluded_dates: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    fn snapshot(id: i32, now: DateTime<Utc>) -> ClientSnapshot {
        ClientSnapshot {
            client_id: ClientId::new(id),
            telegram_id: TelegramId::new(i64::from(id) * 100),
            company_name: format!("Client {id}"),
            bonus_balance: Decimal::ZERO,
            expiring_bonus: Decimal::ZERO,
            last_order_at: Some(now - TimeDelta::days(2)),
            approved_at: Some(now - TimeDelta::days(60)),
            last_message_at: None,
        }
    }

    #[test]
    fn test_reasons_in_priority_order() {
        let now = Utc::now();

        let mut balance = snapshot(1, now);
        balance.bonus_balance = Decimal::from(1500);

        let mut idle = snapshot(2, now);
        idle.last_order_at = Some(now - TimeDelta::days(20));

        let mut expiring = snapshot(3, now);
        expiring.bonus_balance = Decimal::from(1500);
        expiring.expiring_bonus = Decimal::from(500);
        expiring.last_order_at = Some(now - TimeDelta::days(30));

        let picked = select_candidates(vec![balance, idle, expiring, snapshot(4, now)], &settings(), now, 0);
        let order: Vec<(i32, OutreachReason)> = picked
            .iter()
            .map(|c| (c.client.client_id.as_i32(), c.reason))
            .collect();
        assert_eq!(
            order,
            vec![
                (3, OutreachReason::BonusExpiring),
                (2, OutreachReason::NoRecentOrder),
                (1, OutreachReason::BonusBalance),
            ]
        );
    }

    #[test]
    fn test_never_ordered_counts_from_approval() {
        let now = Utc::now();
        let mut fresh = snapshot(1, now);
        fresh.last_order_at = None;
        fresh.approved_at = Some(now - TimeDelta::days(3));

        let mut stale = snapshot(2, now);
        stale.last_order_at = None;

        let picked = select_candidates(vec![fresh, stale], &settings(), now, 0);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].client.client_id, ClientId::new(2));
    }

    #[test]
    fn test_recently_messaged_clients_are_skipped() {
        let now = Utc::now();
        let mut client = snapshot(1, now);
        client.last_order_at = Some(now - TimeDelta::days(20));
        client.last_message_at = Some(now - TimeDelta::days(1));

        assert!(select_candidates(vec![client.clone()], &settings(), now, 0).is_empty());

        client.last_message_at = Some(now - TimeDelta::days(3));
        assert_eq!(select_candidates(vec![client], &settings(), now, 0).len(), 1);
    }

    #[test]
    fn test_daily_limit_counts_messages_already_sent() {
        let now = Utc::now();
        let clients: Vec<ClientSnapshot> = (1..=5)
            .map(|id| {
                let mut c = snapshot(id, now);
                c.last_order_at = None;
                c
            })
            .collect();

        let mut limited = settings();
        limited.max_messages_per_day = 4;

        assert_eq!(select_candidates(clients.clone(), &limited, now, 0).len(), 4);
        assert_eq!(select_candidates(clients.clone(), &limited, now, 3).len(), 1);
        assert!(select_candidates(clients, &limited, now, 6).is_empty());
    }

    #[test]
    fn test_expiring_message_caps_amount_by_balance() {
        let now = Utc::now();
        let mut client = snapshot(1, now);
        client.company_name = "ИП <Ромашка>".to_string();
        client.bonus_balance = Decimal::from(300);
        client.expiring_bonus = Decimal::from(800);

        let candidate = Candidate {
            client,
            reason: OutreachReason::BonusExpiring,
        };
        let text = message_text(&candidate, &settings());
        assert!(text.contains("ИП &lt;Ромашка&gt;"));
        assert!(text.contains("сгорают бонусы: 300₸"));
    }
}
