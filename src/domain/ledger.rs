use super::money::Money;
use super::payment::{PaymentSubmission, SubmissionStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Unpaid,
    Partial,
    FullyPaid,
}

impl PaymentState {
    /// Text shown to customers and staff.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentState::Unpaid => "Unpaid",
            PaymentState::Partial => "Partially paid",
            PaymentState::FullyPaid => "Fully paid",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentState::Unpaid => "UNPAID",
            PaymentState::Partial => "PARTIAL",
            PaymentState::FullyPaid => "FULLY_PAID",
        })
    }
}

/// Totals derived from a booking's submissions.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct LedgerSummary {
    pub total_amount: Money,
    pub verified_paid: Money,
    /// Submitted but not yet reviewed.
    pub pending_amount: Money,
    /// Never negative; see `credit`.
    pub balance: Money,
    /// Verified payments beyond the total, within the overpayment tolerance.
    pub credit: Money,
    pub progress_percent: u8,
    pub payment_state: PaymentState,
    pub verified_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
}

impl LedgerSummary {
    pub fn is_fully_paid(&self) -> bool {
        self.payment_state == PaymentState::FullyPaid
    }
}

/// Pure view over the submissions of one booking. Holds no state of its own and
/// is recomputed on every read.
pub struct PaymentLedger;

impl PaymentLedger {
    pub fn summarize(total_amount: Money, submissions: &[PaymentSubmission]) -> LedgerSummary {
        let mut verified_paid = Money::ZERO;
        let mut pending_amount = Money::ZERO;
        let (mut verified_count, mut pending_count, mut rejected_count) = (0, 0, 0);

        for submission in submissions {
            match submission.status() {
                SubmissionStatus::Verified => {
                    verified_paid = verified_paid.saturating_add(submission.amount);
                    verified_count += 1;
                }
                SubmissionStatus::Pending => {
                    pending_amount = pending_amount.saturating_add(submission.amount);
                    pending_count += 1;
                }
                SubmissionStatus::Rejected => rejected_count += 1,
            }
        }

        let payment_state = if verified_paid.is_zero() {
            PaymentState::Unpaid
        } else if verified_paid >= total_amount {
            PaymentState::FullyPaid
        } else {
            PaymentState::Partial
        };

        LedgerSummary {
            total_amount,
            verified_paid,
            pending_amount,
            balance: total_amount.saturating_sub(verified_paid),
            credit: verified_paid.saturating_sub(total_amount),
            progress_percent: verified_paid.percent_of(total_amount),
            payment_state,
            verified_count,
            pending_count,
            rejected_count,
        }
    }
}
