//! Staff identity.

use serde::Serialize;

use snacklane_core::{TelegramId, UserId, UserRole};

/// An authenticated manager or admin.
#[derive(Debug, Clone, Serialize)]
pub struct Staff {
    pub id: UserId,
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub role: UserRole,
}

impl Staff {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// The manager id that restricts what this staff member sees.
    ///
    /// `None` for admins, who see everything.
    #[must_use]
    pub const fn manager_scope(&self) -> Option<UserId> {
        if self.is_admin() { None } else { Some(self.id) }
    }

    /// Whether a record assigned to `manager_id` is visible.
    #[must_use]
    pub fn can_access(&self, manager_id: Option<UserId>) -> bool {
        self.manager_scope()
            .is_none_or(|me| manager_id == Some(me))
    }
}
