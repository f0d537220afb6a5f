use super::money::Money;
use super::rejection::Rejection;
use crate::error::{EngineError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, stable identity of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of applying an action that may already have happened.
///
/// `Unchanged` marks an idempotent retry: nothing is persisted or announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Unchanged,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Draft,
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Draft => "DRAFT",
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(BookingStatus::Draft),
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "REJECTED" => Ok(BookingStatus::Rejected),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(EngineError::ValidationError(format!(
                "Unknown booking status '{other}'"
            ))),
        }
    }
}

/// Every mutating operation the engine exposes, used to report refused transitions.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BookingAction {
    Submit,
    Approve,
    Reject,
    Reconsider,
    MarkResolved,
    MarkUnresolved,
    Cancel,
    Delete,
    EditTotal,
    SubmitPayment,
    ReviewPayment,
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            BookingAction::Submit => "submit",
            BookingAction::Approve => "approve",
            BookingAction::Reject => "reject",
            BookingAction::Reconsider => "reconsider",
            BookingAction::MarkResolved => "mark resolved",
            BookingAction::MarkUnresolved => "mark unresolved",
            BookingAction::Cancel => "cancel",
            BookingAction::Delete => "delete",
            BookingAction::EditTotal => "edit total",
            BookingAction::SubmitPayment => "submit payment",
            BookingAction::ReviewPayment => "review payment",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItineraryKind {
    #[default]
    Standard,
    Custom,
}

/// Reference into the itinerary content store. Never interpreted here.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(transparent)]
pub struct ItineraryRef(pub String);

/// Customer-entered data a booking is created from.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct BookingDraft {
    /// Human-facing code. Generated when absent.
    pub code: Option<String>,
    pub customer_name: String,
    pub contact: String,
    pub itinerary: ItineraryRef,
    pub itinerary_kind: ItineraryKind,
    pub travel_date: Option<NaiveDate>,
    pub travelers: u16,
    pub total_amount: Money,
}

/// Lifecycle state. The rejection record lives inside the `Rejected` variant so
/// it cannot outlive that state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    Draft,
    Pending,
    Confirmed,
    Rejected(Rejection),
    Cancelled,
}

impl BookingState {
    pub fn status(&self) -> BookingStatus {
        match self {
            BookingState::Draft => BookingStatus::Draft,
            BookingState::Pending => BookingStatus::Pending,
            BookingState::Confirmed => BookingStatus::Confirmed,
            BookingState::Rejected(_) => BookingStatus::Rejected,
            BookingState::Cancelled => BookingStatus::Cancelled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Booking {
    pub id: BookingId,
    pub code: String,
    pub customer_name: String,
    pub contact: String,
    pub itinerary: ItineraryRef,
    pub itinerary_kind: ItineraryKind,
    pub travel_date: Option<NaiveDate>,
    pub travelers: u16,
    total_amount: Money,
    state: BookingState,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(id: BookingId, code: String, draft: BookingDraft, now: DateTime<Utc>) -> Result<Self> {
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(EngineError::ValidationError(
                "Booking code cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            code,
            customer_name: draft.customer_name.trim().to_string(),
            contact: draft.contact.trim().to_string(),
            itinerary: draft.itinerary,
            itinerary_kind: draft.itinerary_kind,
            travel_date: draft.travel_date,
            travelers: draft.travelers,
            total_amount: draft.total_amount,
            state: BookingState::Draft,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn status(&self) -> BookingStatus {
        self.state.status()
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.state {
            BookingState::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    /// `Some` only while rejected.
    pub fn is_resolved(&self) -> Option<bool> {
        self.rejection().map(Rejection::is_resolved)
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Names of the draft fields still missing before the booking can be submitted.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.customer_name.is_empty() {
            missing.push("customer name");
        }
        if self.contact.is_empty() {
            missing.push("contact");
        }
        if self.itinerary.0.trim().is_empty() {
            missing.push("itinerary");
        }
        if self.travelers == 0 {
            missing.push("travelers");
        }
        if self.total_amount.is_zero() {
            missing.push("total amount");
        }
        missing
    }

    /// DRAFT → PENDING. Retrying on a pending booking is a no-op.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        match self.state {
            BookingState::Draft => {
                let missing = self.missing_fields();
                if !missing.is_empty() {
                    return Err(EngineError::ValidationError(format!(
                        "Booking {} is incomplete: missing {}",
                        self.code,
                        missing.join(", ")
                    )));
                }
                self.enter(BookingState::Pending, now);
                Ok(Transition::Applied)
            }
            BookingState::Pending => Ok(Transition::Unchanged),
            _ => Err(self.refuse(BookingAction::Submit)),
        }
    }

    /// PENDING → CONFIRMED. Retrying on a confirmed booking is a no-op.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        match self.state {
            BookingState::Pending => {
                self.enter(BookingState::Confirmed, now);
                Ok(Transition::Applied)
            }
            BookingState::Confirmed => Ok(Transition::Unchanged),
            _ => Err(self.refuse(BookingAction::Approve)),
        }
    }

    /// PENDING → REJECTED with `is_resolved = false`.
    ///
    /// A retry carrying the same notes is a no-op, even after the rejection was
    /// marked resolved: the resolved flag is kept. Different notes on an already
    /// rejected booking must go through `mark_unresolved`.
    pub fn reject(&mut self, reason: &str, resolution: &str, now: DateTime<Utc>) -> Result<Transition> {
        match &self.state {
            BookingState::Pending => {
                let rejection = Rejection::new(reason, resolution, now)?;
                self.enter(BookingState::Rejected(rejection), now);
                Ok(Transition::Applied)
            }
            BookingState::Rejected(existing) if existing.matches(reason, resolution) => {
                Ok(Transition::Unchanged)
            }
            _ => Err(self.refuse(BookingAction::Reject)),
        }
    }

    /// REJECTED → PENDING, only once the rejection is resolved.
    pub fn reconsider(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        match &self.state {
            BookingState::Rejected(rejection) if rejection.is_resolved() => {
                self.enter(BookingState::Pending, now);
                Ok(Transition::Applied)
            }
            BookingState::Rejected(_) => Err(EngineError::NotResolved(self.code.clone())),
            _ => Err(self.refuse(BookingAction::Reconsider)),
        }
    }

    pub fn mark_resolved(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        let outcome = match &mut self.state {
            BookingState::Rejected(rejection) => rejection.mark_resolved(),
            _ => return Err(self.refuse(BookingAction::MarkResolved)),
        };
        if outcome == Transition::Applied {
            self.touch(now);
        }
        Ok(outcome)
    }

    pub fn mark_unresolved(
        &mut self,
        reason: &str,
        resolution: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        let outcome = match &mut self.state {
            BookingState::Rejected(rejection) => rejection.mark_unresolved(reason, resolution)?,
            _ => return Err(self.refuse(BookingAction::MarkUnresolved)),
        };
        if outcome == Transition::Applied {
            self.touch(now);
        }
        Ok(outcome)
    }

    /// DRAFT/REJECTED → CANCELLED. Retrying on a cancelled booking is a no-op.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        match self.state {
            BookingState::Draft | BookingState::Rejected(_) => {
                self.enter(BookingState::Cancelled, now);
                Ok(Transition::Applied)
            }
            BookingState::Cancelled => Ok(Transition::Unchanged),
            _ => Err(self.refuse(BookingAction::Cancel)),
        }
    }

    pub fn ensure_deletable(&self) -> Result<()> {
        match self.state {
            BookingState::Draft | BookingState::Rejected(_) => Ok(()),
            _ => Err(self.refuse(BookingAction::Delete)),
        }
    }

    pub fn ensure_accepts_payments(&self) -> Result<()> {
        match self.state {
            BookingState::Pending | BookingState::Confirmed | BookingState::Rejected(_) => Ok(()),
            _ => Err(self.refuse(BookingAction::SubmitPayment)),
        }
    }

    /// Verified money can only land on a booking that still takes payments.
    /// Rejecting a leftover submission stays allowed so a cancelled booking's
    /// queue can be cleared.
    pub fn ensure_accepts_verification(&self) -> Result<()> {
        match self.state {
            BookingState::Pending | BookingState::Confirmed | BookingState::Rejected(_) => Ok(()),
            _ => Err(self.refuse(BookingAction::ReviewPayment)),
        }
    }

    /// Staff edit of the price before confirmation.
    ///
    /// The new total may not drop below what has already been verified as paid.
    pub fn edit_total(
        &mut self,
        new_total: Money,
        verified_paid: Money,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        match self.state {
            BookingState::Draft | BookingState::Pending | BookingState::Rejected(_) => {}
            _ => return Err(self.refuse(BookingAction::EditTotal)),
        }
        if new_total.is_zero() {
            return Err(EngineError::InvalidAmount(
                "Total amount must be greater than zero".to_string(),
            ));
        }
        if new_total < verified_paid {
            return Err(EngineError::OverpaymentGuard {
                attempted: verified_paid,
                limit: new_total,
            });
        }
        if new_total == self.total_amount {
            return Ok(Transition::Unchanged);
        }
        self.total_amount = new_total;
        self.touch(now);
        Ok(Transition::Applied)
    }

    fn enter(&mut self, state: BookingState, now: DateTime<Utc>) {
        self.state = state;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }

    fn refuse(&self, action: BookingAction) -> EngineError {
        EngineError::InvalidTransition {
            action,
            from: self.status().to_string(),
        }
    }
}
