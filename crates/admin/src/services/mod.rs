//! Business services for admin.
//!
//! - `order_status` - status change transaction (accrual, cancellation reversal)
//! - `bonus_expiry` - writes off expired bonuses
//! - `outreach` - candidate selection and sending
//! - `scheduler` - background loop running expiry and outreach
//! - `notifications` - Telegram messages to clients and admins

pub mod bonus_expiry;
pub mod notifications;
pub mod order_status;
pub mod outreach;
pub mod scheduler;
