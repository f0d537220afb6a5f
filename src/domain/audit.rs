use super::booking::BookingId;
use super::money::Money;
use super::payment::{PaymentMethod, ReviewOutcome, SubmissionId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditKind {
    BookingCreated { code: String },
    BookingSubmitted,
    BookingApproved,
    BookingRejected { reason: String, resolution: String },
    BookingReconsidered,
    RejectionResolved,
    RejectionReopened { reason: String, resolution: String },
    BookingCancelled,
    BookingDeleted,
    TotalAmountEdited { from: Money, to: Money },
    PaymentSubmitted {
        submission_id: SubmissionId,
        amount: Money,
        method: PaymentMethod,
    },
    PaymentReviewed {
        submission_id: SubmissionId,
        outcome: ReviewOutcome,
    },
}

/// A committed change, handed to the notification/audit surface.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct AuditEvent {
    pub booking_id: BookingId,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: AuditKind,
}

impl AuditEvent {
    pub fn new(booking_id: BookingId, at: DateTime<Utc>, kind: AuditKind) -> Self {
        Self {
            booking_id,
            at,
            kind,
        }
    }
}
