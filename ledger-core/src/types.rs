//! Core types for the trip ledger
//!
//! All types are designed for:
//! - Deterministic serialization (amounts as decimal strings)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User identifier (opaque id issued by the membership system)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round a monetary amount to currency minor units (2 decimal places)
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One minor currency unit, the tolerance for balance comparisons
pub fn cent_epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Shared expense recorded against a trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Unique expense ID (UUIDv7 for time-ordering)
    pub expense_id: Uuid,

    /// Trip this expense belongs to
    pub trip_id: Uuid,

    /// Human-readable title
    pub title: String,

    /// Total amount paid (exact decimal, >= 0)
    pub amount: Decimal,

    /// Currency label (display only, no conversion)
    pub currency: String,

    /// Expense category
    pub category: String,

    /// Member who paid
    pub paid_by: UserId,

    /// Owning activity, if auto-generated from participation
    pub activity_id: Option<Uuid>,

    /// Whether a confirmed settlement has already covered this expense
    pub is_settled: bool,

    /// Created timestamp (the integrity cutoff compares against this)
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Whether this expense was generated from an activity
    pub fn is_activity_expense(&self) -> bool {
        self.activity_id.is_some()
    }
}

/// One participant's owed share of one expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSplit {
    /// Unique split ID
    pub split_id: Uuid,

    /// Expense this split belongs to
    pub expense_id: Uuid,

    /// Member who owes this share
    pub user_id: UserId,

    /// Owed amount (exact decimal)
    pub amount: Decimal,

    /// Whether the share has been paid back
    pub is_paid: bool,
}

/// Settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SettlementStatus {
    /// Declared by the payer, awaiting payee confirmation
    Pending = 1,
    /// Confirmed by the payee (terminal, adjusts balances)
    Confirmed = 2,
    /// Rejected by the payee (terminal, no balance effect)
    Rejected = 3,
}

/// Recorded real-world payment between two members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Unique settlement ID (UUIDv7 for time-ordering)
    pub settlement_id: Uuid,

    /// Trip this settlement belongs to
    pub trip_id: Uuid,

    /// Member who pays
    pub payer_id: UserId,

    /// Member who receives
    pub payee_id: UserId,

    /// Settled amount (exact decimal, > 0)
    pub amount: Decimal,

    /// Currency label (display only)
    pub currency: String,

    /// Lifecycle status
    pub status: SettlementStatus,

    /// Payment method hint (e.g. "bank-transfer", "cash")
    pub payment_method: Option<String>,

    /// Externally generated payment link, if any
    pub payment_link: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Confirmation timestamp
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Rejection timestamp
    pub rejected_at: Option<DateTime<Utc>>,

    /// Payee who confirmed or rejected
    pub resolved_by: Option<UserId>,
}

impl Settlement {
    /// Check if settlement is in terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            SettlementStatus::Confirmed | SettlementStatus::Rejected
        )
    }

    /// Check if settlement adjusts balances
    pub fn is_confirmed(&self) -> bool {
        self.status == SettlementStatus::Confirmed
    }
}

/// Membership status within a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MemberStatus {
    /// Active member
    Active = 1,
    /// Invited but not yet joined
    Invited = 2,
}

/// RSVP status (trip-level and per-activity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RsvpStatus {
    /// Attending
    Going = 1,
    /// Not attending
    NotGoing = 2,
    /// Undecided
    Pending = 3,
}

/// Trip member (owned by the membership system, mirrored here)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Trip this membership belongs to
    pub trip_id: Uuid,

    /// Member's user ID
    pub user_id: UserId,

    /// Whether the member administers the trip
    pub is_admin: bool,

    /// Membership status
    pub status: MemberStatus,

    /// Trip-level RSVP
    pub rsvp_status: RsvpStatus,
}

/// How an activity is paid for
///
/// Closed variant set so the split recalculator is exhaustively checked at
/// compile time. Only `Prepaid` and `PrepaidPerPerson` with positive cost
/// drive ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentType {
    /// No cost
    Free,
    /// Cost already included elsewhere
    Included,
    /// Each attendee pays at the venue
    PaymentOnsite,
    /// Each attendee pays in advance on their own
    PayInAdvance,
    /// Organizer paid one shared cost, split evenly among attendees
    Prepaid {
        /// Total shared cost
        cost: Decimal,
    },
    /// Organizer paid a flat fee per attendee
    PrepaidPerPerson {
        /// Fee owed by each attendee
        cost: Decimal,
    },
}

impl PaymentType {
    /// Cost that drives ledger mutation, if any
    pub fn billable_cost(&self) -> Option<Decimal> {
        match self {
            PaymentType::Prepaid { cost } | PaymentType::PrepaidPerPerson { cost }
                if *cost > Decimal::ZERO =>
            {
                Some(*cost)
            }
            _ => None,
        }
    }

    /// Whether this is the shared-cost variant
    pub fn is_shared(&self) -> bool {
        matches!(self, PaymentType::Prepaid { .. })
    }

    /// Whether this is the flat per-attendee variant
    pub fn is_per_person(&self) -> bool {
        matches!(self, PaymentType::PrepaidPerPerson { .. })
    }
}

/// Trip activity (owned by the activity system, mirrored here)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity ID
    pub activity_id: Uuid,

    /// Trip this activity belongs to
    pub trip_id: Uuid,

    /// Human-readable title
    pub title: String,

    /// Organizer (fronts prepaid costs)
    pub created_by: UserId,

    /// Payment model
    pub payment: PaymentType,
}

/// A member's RSVP on one activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRsvp {
    /// Activity being responded to
    pub activity_id: Uuid,

    /// Responding member
    pub user_id: UserId,

    /// Current answer
    pub status: RsvpStatus,

    /// Last change timestamp
    pub updated_at: DateTime<Utc>,
}

/// Removal policy version, stored per trip
///
/// Existing trips keep the behavior they were created with; new versions are
/// added as new variants without touching the old ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RemovalPolicyVersion {
    /// Any nonzero total balance blocks removal
    Legacy = 1,
    /// Manual and prepaid-organizer components checked independently
    SplitBalance = 2,
}

/// Per-trip ledger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSettings {
    /// Trip ID
    pub trip_id: Uuid,

    /// Currency label for new expenses and settlements
    pub default_currency: String,

    /// Which removal policy governs this trip
    pub removal_policy: RemovalPolicyVersion,
}

/// Input for creating an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseDraft {
    /// Human-readable title
    pub title: String,

    /// Total amount paid (>= 0)
    pub amount: Decimal,

    /// Expense category
    pub category: String,

    /// Member who paid
    pub paid_by: UserId,

    /// Owning activity, if any
    pub activity_id: Option<Uuid>,
}

/// Input for creating a split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitDraft {
    /// Member who owes this share
    pub user_id: UserId,

    /// Owed amount
    pub amount: Decimal,
}
