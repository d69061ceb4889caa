//! Status and role enums for users, clients, orders and the bonus ledger.

use serde::{Deserialize, Serialize};

/// Role of a Telegram user in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// A business buyer using the mini-app.
    #[default]
    Client,
    /// Staff member responsible for a set of clients.
    Manager,
    /// Full access to every client, order and setting.
    Admin,
}

impl UserRole {
    /// Whether this role may use the admin API.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Manager => write!(f, "manager"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Approval state of a client's business profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.client_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// Registered, waiting for a manager to approve.
    #[default]
    Pending,
    /// May browse prices and place orders.
    Active,
    /// Access revoked.
    Blocked,
}

impl ClientStatus {
    /// Status restored when a block is lifted.
    ///
    /// Only clients that were approved before become active again.
    #[must_use]
    pub const fn after_unblock(was_approved: bool) -> Self {
        if was_approved {
            Self::Active
        } else {
            Self::Pending
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

impl std::str::FromStr for ClientStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "blocked" => Ok(Self::Blocked),
            _ => Err(format!("invalid client status: {s}")),
        }
    }
}

/// Error returned for a disallowed order status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order cannot move from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: OrderStatus,
    /// Requested status.
    pub to: OrderStatus,
}

/// Fulfillment status of an order.
///
/// Orders move forward through `new → confirmed → preparing → delivering →
/// delivered`. Any state that is not terminal may be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Confirmed,
    Preparing,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Position in the fulfillment pipeline; `None` for cancelled.
    const fn stage(self) -> Option<u8> {
        match self {
            Self::New => Some(0),
            Self::Confirmed => Some(1),
            Self::Preparing => Some(2),
            Self::Delivering => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => None,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Check that moving to `next` is allowed.
    ///
    /// Forward moves may skip stages; backward moves are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the move is not allowed.
    pub const fn transition_to(self, next: Self) -> Result<Self, InvalidTransition> {
        let err = InvalidTransition {
            from: self,
            to: next,
        };
        if self.is_terminal() {
            return Err(err);
        }
        match (self.stage(), next.stage()) {
            (_, None) => Ok(next),
            (Some(current), Some(target)) if target > current => Ok(next),
            _ => Err(err),
        }
    }

    /// Human-readable label used in Telegram notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "Новый",
            Self::Confirmed => "Подтвержден",
            Self::Preparing => "Собирается",
            Self::Delivering => "В доставке",
            Self::Delivered => "Доставлен",
            Self::Cancelled => "Отменен",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Preparing => write!(f, "preparing"),
            Self::Delivering => write!(f, "delivering"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "delivering" => Ok(Self::Delivering),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Kind of bonus ledger entry.
///
/// Amounts are signed: `Earn` and `Refund` are positive, `Spend` and
/// `Expire` are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.bonus_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Earn,
    Spend,
    Expire,
    Refund,
}

impl std::fmt::Display for BonusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Earn => write!(f, "earn"),
            Self::Spend => write!(f, "spend"),
            Self::Expire => write!(f, "expire"),
            Self::Refund => write!(f, "refund"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert_eq!(
            OrderStatus::New.transition_to(OrderStatus::Confirmed),
            Ok(OrderStatus::Confirmed)
        );
        assert_eq!(
            OrderStatus::Confirmed.transition_to(OrderStatus::Delivering),
            Ok(OrderStatus::Delivering)
        );
        assert_eq!(
            OrderStatus::New.transition_to(OrderStatus::Delivered),
            Ok(OrderStatus::Delivered)
        );
    }

    #[test]
    fn test_backward_transition_rejected() {
        let err = OrderStatus::Delivering
            .transition_to(OrderStatus::Confirmed)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Delivering);
        assert_eq!(err.to, OrderStatus::Confirmed);
        assert!(
            OrderStatus::Preparing
                .transition_to(OrderStatus::Preparing)
                .is_err()
        );
    }

    #[test]
    fn test_cancel_from_any_open_state() {
        for status in [
            OrderStatus::New,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
        ] {
            assert!(status.transition_to(OrderStatus::Cancelled).is_ok());
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(
            OrderStatus::Delivered
                .transition_to(OrderStatus::Cancelled)
                .is_err()
        );
        assert!(
            OrderStatus::Cancelled
                .transition_to(OrderStatus::New)
                .is_err()
        );
    }

    #[test]
    fn test_order_status_string_roundtrip() {
        for status in [
            OrderStatus::New,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_unblock_never_skips_approval() {
        assert_eq!(ClientStatus::after_unblock(true), ClientStatus::Active);
        assert_eq!(ClientStatus::after_unblock(false), ClientStatus::Pending);
    }

    #[test]
    fn test_staff_roles() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Manager.is_staff());
        assert!(!UserRole::Client.is_staff());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ClientStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<BonusKind>("\"refund\"").unwrap(),
            BonusKind::Refund
        );
    }
}
