use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for ledger rows, assigned in append order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RegistrationId(pub u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completed intake handed from the session manager to the admission
/// controller. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub category: String,
    pub player_name: String,
    pub partner_name: Option<String>,
    pub phone: String,
    pub handle: String,
}

/// Whether a registration counts against the category capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Main,
    Waitlist,
}

impl SlotKind {
    pub const fn label(self) -> &'static str {
        match self {
            SlotKind::Main => "main",
            SlotKind::Waitlist => "waitlist",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "main" => Some(SlotKind::Main),
            "waitlist" => Some(SlotKind::Waitlist),
            _ => None,
        }
    }
}

/// Payment progression; advances Unpaid -> PendingReview -> Confirmed and
/// never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PendingReview,
    Confirmed,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PendingReview => "pending_review",
            PaymentStatus::Confirmed => "confirmed",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "pending_review" => Some(PaymentStatus::PendingReview),
            "confirmed" => Some(PaymentStatus::Confirmed),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Registration accepted by the controller but not yet assigned a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub submitted_at: DateTime<Utc>,
    pub category: String,
    pub player_name: String,
    pub partner_name: Option<String>,
    pub phone: String,
    pub handle: String,
    pub slot: SlotKind,
}

impl NewRegistration {
    /// Every registration starts its payment life Unpaid with no receipt.
    pub fn into_registration(self, id: RegistrationId) -> Registration {
        Registration {
            id,
            submitted_at: self.submitted_at,
            category: self.category,
            player_name: self.player_name,
            partner_name: self.partner_name,
            phone: self.phone,
            handle: self.handle,
            slot: self.slot,
            payment: PaymentStatus::Unpaid,
            receipt_ref: None,
        }
    }
}

/// Durable registration row. Slot kind is fixed at creation; only the
/// payment status and receipt reference change afterwards. Rows are never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub submitted_at: DateTime<Utc>,
    pub category: String,
    pub player_name: String,
    pub partner_name: Option<String>,
    pub phone: String,
    pub handle: String,
    pub slot: SlotKind,
    pub payment: PaymentStatus,
    pub receipt_ref: Option<String>,
}

impl Registration {
    pub fn view(&self) -> RegistrationView {
        RegistrationView {
            registration_id: self.id,
            category: self.category.clone(),
            player_name: self.player_name.clone(),
            partner_name: self.partner_name.clone(),
            slot: self.slot.label(),
            payment: self.payment.label(),
            receipt_ref: self.receipt_ref.clone(),
        }
    }
}

/// Sanitized representation of a registration for API responses; phone
/// numbers stay out of it.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationView {
    pub registration_id: RegistrationId,
    pub category: String,
    pub player_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    pub slot: &'static str,
    pub payment: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_ref: Option<String>,
}
