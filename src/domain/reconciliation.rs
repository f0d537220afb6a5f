use super::booking::{Booking, BookingId, BookingStatus};
use super::ledger::{LedgerSummary, PaymentState};
use super::money::Money;
use serde::{Deserialize, Serialize};

/// Read-only summary of a booking's lifecycle and payment position.
///
/// Built from a booking snapshot and the ledger summary of its submissions so that
/// consumers never recompute the ledger themselves.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct ReconciliationProjection {
    pub booking_id: BookingId,
    pub code: String,
    pub status: BookingStatus,
    /// Present only while the booking is rejected.
    pub is_resolved: Option<bool>,
    pub payment_state: PaymentState,
    pub payment_label: String,
    pub total_amount: Money,
    pub verified_paid: Money,
    pub pending_amount: Money,
    pub balance: Money,
    pub credit: Money,
    pub progress_percent: u8,
    pub fully_paid: bool,
}

impl ReconciliationProjection {
    pub fn project(booking: &Booking, ledger: &LedgerSummary) -> Self {
        Self {
            booking_id: booking.id,
            code: booking.code.clone(),
            status: booking.status(),
            is_resolved: booking.is_resolved(),
            payment_state: ledger.payment_state,
            payment_label: ledger.payment_state.label().to_string(),
            total_amount: ledger.total_amount,
            verified_paid: ledger.verified_paid,
            pending_amount: ledger.pending_amount,
            balance: ledger.balance,
            credit: ledger.credit,
            progress_percent: ledger.progress_percent,
            fully_paid: ledger.is_fully_paid(),
        }
    }
}
