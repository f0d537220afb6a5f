use super::booking::{BookingAction, BookingId};
use super::ledger::LedgerSummary;
use super::money::Money;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    #[serde(alias = "cash")]
    Cash,
    #[serde(alias = "gcash")]
    Gcash,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentKind {
    #[serde(alias = "full")]
    Full,
    #[serde(alias = "partial")]
    Partial,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Verified => "VERIFIED",
            SubmissionStatus::Rejected => "REJECTED",
        })
    }
}

/// Staff decision on a pending submission.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewOutcome {
    #[serde(alias = "verified")]
    Verified,
    #[serde(alias = "rejected")]
    Rejected,
}

impl From<ReviewOutcome> for SubmissionStatus {
    fn from(outcome: ReviewOutcome) -> Self {
        match outcome {
            ReviewOutcome::Verified => SubmissionStatus::Verified,
            ReviewOutcome::Rejected => SubmissionStatus::Rejected,
        }
    }
}

/// Reference returned by the proof store. Never interpreted here.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(transparent)]
pub struct ProofRef(pub String);

/// A customer's request to pay. `amount` is ignored for `FULL` payments.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PaymentRequest {
    pub booking_id: BookingId,
    pub amount: Option<Money>,
    pub method: PaymentMethod,
    pub kind: PaymentKind,
    pub proof: Option<ProofRef>,
}

/// Rules the submission workflow applies beyond the fixed validation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPolicy {
    /// Block GCash submissions that carry no proof instead of only warning.
    pub require_gcash_proof: bool,
    /// Allowed verified overpayment, in basis points of the total.
    pub overpayment_tolerance_bps: u32,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            require_gcash_proof: true,
            overpayment_tolerance_bps: 0,
        }
    }
}

/// The amount a request settles on once it has passed validation.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AcceptedAmount {
    pub amount: Money,
    /// GCash without proof that the policy let through.
    pub missing_proof: bool,
}

/// Runs the submission checks in order, failing on the first violation.
pub fn accept_amount(
    request: &PaymentRequest,
    ledger: &LedgerSummary,
    policy: &PaymentPolicy,
) -> Result<AcceptedAmount> {
    let balance = ledger.balance;
    let amount = match request.kind {
        PaymentKind::Full => {
            if balance.is_zero() {
                return Err(EngineError::InvalidAmount(
                    "Booking has no outstanding balance".to_string(),
                ));
            }
            balance
        }
        PaymentKind::Partial => {
            let amount = request.amount.ok_or_else(|| {
                EngineError::InvalidAmount("Partial payments need an amount".to_string())
            })?;
            if amount.is_zero() {
                return Err(EngineError::InvalidAmount(
                    "Amount must be positive".to_string(),
                ));
            }
            if amount > balance {
                return Err(EngineError::InvalidAmount(format!(
                    "{amount} exceeds the outstanding balance of {balance}"
                )));
            }
            amount
        }
    };

    let missing_proof = request.method == PaymentMethod::Gcash && request.proof.is_none();
    if missing_proof && policy.require_gcash_proof {
        return Err(EngineError::MissingProof);
    }

    Ok(AcceptedAmount {
        amount,
        missing_proof,
    })
}

/// Fails when verifying `amount` would push the verified total past the
/// tolerated ceiling.
pub fn check_overpayment(ledger: &LedgerSummary, amount: Money, policy: &PaymentPolicy) -> Result<()> {
    let attempted = ledger.verified_paid.checked_add(amount)?;
    let limit = ledger
        .total_amount
        .with_tolerance_bps(policy.overpayment_tolerance_bps);
    if attempted > limit {
        return Err(EngineError::OverpaymentGuard { attempted, limit });
    }
    Ok(())
}

/// One discrete payment attempt against a booking.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PaymentSubmission {
    pub id: SubmissionId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub kind: PaymentKind,
    pub proof: Option<ProofRef>,
    status: SubmissionStatus,
    submitted_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
}

impl PaymentSubmission {
    pub fn new(request: PaymentRequest, accepted: AcceptedAmount, now: DateTime<Utc>) -> Self {
        Self {
            id: SubmissionId::new(),
            booking_id: request.booking_id,
            amount: accepted.amount,
            method: request.method,
            kind: request.kind,
            proof: request.proof,
            status: SubmissionStatus::Pending,
            submitted_at: now,
            reviewed_at: None,
        }
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    /// PENDING → VERIFIED/REJECTED. Reviewed submissions are final.
    pub fn review(&mut self, outcome: ReviewOutcome, now: DateTime<Utc>) -> Result<()> {
        if self.status != SubmissionStatus::Pending {
            return Err(EngineError::InvalidTransition {
                action: BookingAction::ReviewPayment,
                from: self.status.to_string(),
            });
        }
        self.status = outcome.into();
        self.reviewed_at = Some(now);
        Ok(())
    }
}
