use super::locks::BookingLocks;
use crate::domain::audit::{AuditEvent, AuditKind};
use crate::domain::booking::{Booking, BookingDraft, BookingId, Transition};
use crate::domain::ledger::{LedgerSummary, PaymentLedger};
use crate::domain::money::Money;
use crate::domain::payment::{
    PaymentPolicy, PaymentRequest, PaymentSubmission, ReviewOutcome, SubmissionId, accept_amount,
    check_overpayment,
};
use crate::domain::ports::{AuditSinkBox, BookingStoreBox, SubmissionStoreBox};
use crate::domain::reconciliation::ReconciliationProjection;
use crate::error::{EngineError, Result};
use crate::infrastructure::tracing_audit::TracingAuditSink;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// The main entry point for booking lifecycle and payment operations.
///
/// `BookingEngine` owns the storage backends and serialises every mutation of a
/// booking behind that booking's lock: load, apply the pure domain transition to
/// a private copy, persist a single record. A refused transition therefore
/// leaves storage untouched. Reads take no lock and work on the snapshot they
/// load.
pub struct BookingEngine {
    bookings: BookingStoreBox,
    submissions: SubmissionStoreBox,
    audit: AuditSinkBox,
    locks: BookingLocks,
    creation: Mutex<()>,
    policy: PaymentPolicy,
}

impl BookingEngine {
    /// Creates a new `BookingEngine` that logs audit events through `tracing` and
    /// applies the default payment policy.
    ///
    /// # Arguments
    ///
    /// * `bookings` - The store for booking records.
    /// * `submissions` - The store for payment submissions.
    pub fn new(bookings: BookingStoreBox, submissions: SubmissionStoreBox) -> Self {
        Self {
            bookings,
            submissions,
            audit: Box::new(TracingAuditSink),
            locks: BookingLocks::new(),
            creation: Mutex::new(()),
            policy: PaymentPolicy::default(),
        }
    }

    pub fn with_audit(mut self, audit: AuditSinkBox) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_policy(mut self, policy: PaymentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PaymentPolicy {
        &self.policy
    }

    /// Creates a booking in `DRAFT`. A code is generated when the draft has none;
    /// a code already in use is refused.
    #[instrument(skip(self, draft), fields(code = draft.code.as_deref()))]
    pub async fn create_booking(&self, draft: BookingDraft) -> Result<Booking> {
        let id = BookingId::new();
        let code = match draft.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => generate_code(id),
        };

        let _creating = self.creation.lock().await;
        if self.bookings.get_by_code(&code).await?.is_some() {
            return Err(EngineError::ValidationError(format!(
                "Booking code {code} is already in use"
            )));
        }

        let now = Utc::now();
        let booking = Booking::new(id, code, draft, now)?;
        self.bookings.store(booking.clone()).await?;

        info!(booking = %booking.code, total = %booking.total_amount(), "booking created");
        self.emit(
            booking.id,
            now,
            AuditKind::BookingCreated {
                code: booking.code.clone(),
            },
        )
        .await;
        Ok(booking)
    }

    /// DRAFT → PENDING.
    #[instrument(skip(self))]
    pub async fn submit_booking(&self, id: BookingId) -> Result<Booking> {
        self.transition(id, AuditKind::BookingSubmitted, |booking, now| {
            booking.submit(now)
        })
        .await
    }

    /// PENDING → CONFIRMED. Repeating it on a confirmed booking succeeds.
    #[instrument(skip(self))]
    pub async fn approve_booking(&self, id: BookingId) -> Result<Booking> {
        self.transition(id, AuditKind::BookingApproved, |booking, now| {
            booking.approve(now)
        })
        .await
    }

    /// PENDING → REJECTED. Repeating it with the same notes succeeds.
    #[instrument(skip(self))]
    pub async fn reject_booking(
        &self,
        id: BookingId,
        reason: &str,
        resolution: &str,
    ) -> Result<Booking> {
        let kind = AuditKind::BookingRejected {
            reason: reason.trim().to_string(),
            resolution: resolution.trim().to_string(),
        };
        self.transition(id, kind, |booking, now| {
            booking.reject(reason, resolution, now)
        })
        .await
    }

    /// REJECTED → PENDING once the rejection has been resolved.
    #[instrument(skip(self))]
    pub async fn reconsider_booking(&self, id: BookingId) -> Result<Booking> {
        self.transition(id, AuditKind::BookingReconsidered, |booking, now| {
            booking.reconsider(now)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn mark_resolved(&self, id: BookingId) -> Result<Booking> {
        self.transition(id, AuditKind::RejectionResolved, |booking, now| {
            booking.mark_resolved(now)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn mark_unresolved(
        &self,
        id: BookingId,
        reason: &str,
        resolution: &str,
    ) -> Result<Booking> {
        let kind = AuditKind::RejectionReopened {
            reason: reason.trim().to_string(),
            resolution: resolution.trim().to_string(),
        };
        self.transition(id, kind, |booking, now| {
            booking.mark_unresolved(reason, resolution, now)
        })
        .await
    }

    /// DRAFT/REJECTED → CANCELLED.
    #[instrument(skip(self))]
    pub async fn cancel_booking(&self, id: BookingId) -> Result<Booking> {
        self.transition(id, AuditKind::BookingCancelled, |booking, now| {
            booking.cancel(now)
        })
        .await
    }

    /// Removes a DRAFT or REJECTED booking. Its submissions are kept.
    #[instrument(skip(self))]
    pub async fn delete_booking(&self, id: BookingId) -> Result<()> {
        let _guard = self.locks.acquire(id).await;
        let booking = self.load_booking(id).await?;
        booking.ensure_deletable()?;

        self.bookings.remove(id).await?;

        info!(booking = %booking.code, "booking deleted");
        self.emit(id, Utc::now(), AuditKind::BookingDeleted).await;
        Ok(())
    }

    /// Staff edit of the total before confirmation. The new total cannot be
    /// lower than what has already been verified as paid.
    #[instrument(skip(self), fields(new_total = %new_total))]
    pub async fn edit_total_amount(&self, id: BookingId, new_total: Money) -> Result<Booking> {
        let _guard = self.locks.acquire(id).await;
        let mut booking = self.load_booking(id).await?;
        let ledger = self.summarize(&booking).await?;

        let previous = booking.total_amount();
        let now = Utc::now();
        match booking.edit_total(new_total, ledger.verified_paid, now)? {
            Transition::Applied => {
                self.bookings.store(booking.clone()).await?;
                info!(booking = %booking.code, from = %previous, to = %new_total, "total amount edited");
                self.emit(
                    id,
                    now,
                    AuditKind::TotalAmountEdited {
                        from: previous,
                        to: new_total,
                    },
                )
                .await;
            }
            Transition::Unchanged => {
                debug!(booking = %booking.code, "total amount unchanged");
            }
        }
        Ok(booking)
    }

    /// Validates a payment against the booking's current balance and records it
    /// as `PENDING`.
    #[instrument(skip(self, request), fields(booking_id = %request.booking_id, kind = ?request.kind, method = ?request.method))]
    pub async fn submit_payment(&self, request: PaymentRequest) -> Result<PaymentSubmission> {
        let _guard = self.locks.acquire(request.booking_id).await;
        let booking = self.load_booking(request.booking_id).await?;
        booking.ensure_accepts_payments()?;

        let ledger = self.summarize(&booking).await?;
        let accepted = accept_amount(&request, &ledger, &self.policy)?;
        if accepted.missing_proof {
            warn!(booking = %booking.code, "GCash payment accepted without proof");
        }

        let now = Utc::now();
        let submission = PaymentSubmission::new(request, accepted, now);
        self.submissions.store(submission.clone()).await?;

        info!(
            booking = %booking.code,
            submission = %submission.id,
            amount = %submission.amount,
            balance = %ledger.balance,
            "payment submitted for verification"
        );
        self.emit(
            booking.id,
            now,
            AuditKind::PaymentSubmitted {
                submission_id: submission.id,
                amount: submission.amount,
                method: submission.method,
            },
        )
        .await;
        Ok(submission)
    }

    /// Staff review of a pending submission. Reviewed submissions are final.
    /// Verification is refused when it would overpay the booking or when the
    /// booking has been cancelled.
    #[instrument(skip(self))]
    pub async fn verify_payment(
        &self,
        submission_id: SubmissionId,
        outcome: ReviewOutcome,
    ) -> Result<()> {
        let owner = self.load_submission(submission_id).await?.booking_id;

        let _guard = self.locks.acquire(owner).await;
        let mut submission = self.load_submission(submission_id).await?;
        let booking = self.load_booking(owner).await?;
        let ledger = self.summarize(&booking).await?;

        let now = Utc::now();
        submission.review(outcome, now)?;
        if outcome == ReviewOutcome::Verified {
            booking.ensure_accepts_verification()?;
            check_overpayment(&ledger, submission.amount, &self.policy)?;
        }
        self.submissions.store(submission.clone()).await?;

        info!(
            booking = %booking.code,
            submission = %submission.id,
            status = %submission.status(),
            amount = %submission.amount,
            "payment reviewed"
        );
        self.emit(
            owner,
            now,
            AuditKind::PaymentReviewed {
                submission_id,
                outcome,
            },
        )
        .await;
        Ok(())
    }

    pub async fn get_reconciliation(&self, id: BookingId) -> Result<ReconciliationProjection> {
        let booking = self.load_booking(id).await?;
        let ledger = self.summarize(&booking).await?;
        Ok(ReconciliationProjection::project(&booking, &ledger))
    }

    /// Projections for every booking, oldest first.
    pub async fn reconciliation_report(&self) -> Result<Vec<ReconciliationProjection>> {
        let mut report = Vec::new();
        for booking in self.bookings.get_all().await? {
            let ledger = self.summarize(&booking).await?;
            report.push(ReconciliationProjection::project(&booking, &ledger));
        }
        Ok(report)
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Booking> {
        self.load_booking(id).await
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Booking> {
        self.bookings
            .get_by_code(code.trim())
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("booking {code}")))
    }

    pub async fn list_submissions(&self, id: BookingId) -> Result<Vec<PaymentSubmission>> {
        self.submissions.for_booking(id).await
    }

    /// Runs one booking transition under the booking's lock. `Unchanged` outcomes
    /// are idempotent retries and are neither persisted nor announced.
    async fn transition<F>(&self, id: BookingId, kind: AuditKind, apply: F) -> Result<Booking>
    where
        F: FnOnce(&mut Booking, DateTime<Utc>) -> Result<Transition>,
    {
        let _guard = self.locks.acquire(id).await;
        let mut booking = self.load_booking(id).await?;

        let now = Utc::now();
        match apply(&mut booking, now)? {
            Transition::Applied => {
                self.bookings.store(booking.clone()).await?;
                info!(booking = %booking.code, status = %booking.status(), version = booking.version(), "booking updated");
                self.emit(id, now, kind).await;
            }
            Transition::Unchanged => {
                debug!(booking = %booking.code, status = %booking.status(), "repeated action ignored");
            }
        }
        Ok(booking)
    }

    async fn load_booking(&self, id: BookingId) -> Result<Booking> {
        self.bookings
            .get(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))
    }

    async fn load_submission(&self, id: SubmissionId) -> Result<PaymentSubmission> {
        self.submissions
            .get(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("payment submission {id}")))
    }

    async fn summarize(&self, booking: &Booking) -> Result<LedgerSummary> {
        let submissions = self.submissions.for_booking(booking.id).await?;
        Ok(PaymentLedger::summarize(booking.total_amount(), &submissions))
    }

    async fn emit(&self, booking_id: BookingId, at: DateTime<Utc>, kind: AuditKind) {
        self.audit.record(AuditEvent::new(booking_id, at, kind)).await;
    }
}

fn generate_code(id: BookingId) -> String {
    let id = id.to_string();
    format!("BK-{}", id[..8].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingStatus, ItineraryRef};
    use crate::domain::ledger::PaymentState;
    use crate::domain::payment::{PaymentKind, PaymentMethod, ProofRef, SubmissionStatus};
    use crate::infrastructure::in_memory::{
        InMemoryAuditLog, InMemoryBookingStore, InMemorySubmissionStore,
    };

    fn engine() -> BookingEngine {
        BookingEngine::new(
            Box::new(InMemoryBookingStore::new()),
            Box::new(InMemorySubmissionStore::new()),
        )
    }

    fn draft(code: &str, total: u64) -> BookingDraft {
        BookingDraft {
            code: Some(code.to_string()),
            customer_name: "Carla Mendoza".to_string(),
            contact: "carla@example.com".to_string(),
            itinerary: ItineraryRef("el-nido-4d".to_string()),
            travelers: 2,
            total_amount: Money::from_major(total).unwrap(),
            ..BookingDraft::default()
        }
    }

    fn cash(booking_id: BookingId, kind: PaymentKind, amount: Option<u64>) -> PaymentRequest {
        PaymentRequest {
            booking_id,
            amount: amount.map(|major| Money::from_major(major).unwrap()),
            method: PaymentMethod::Cash,
            kind,
            proof: None,
        }
    }

    async fn pending_booking(engine: &BookingEngine, code: &str, total: u64) -> Booking {
        let booking = engine.create_booking(draft(code, total)).await.unwrap();
        engine.submit_booking(booking.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_generated_code_and_duplicates() {
        let engine = engine();
        let generated = engine
            .create_booking(BookingDraft {
                code: None,
                ..draft("", 1_000)
            })
            .await
            .unwrap();
        assert!(generated.code.starts_with("BK-"));
        assert_eq!(generated.code.len(), 11);

        engine.create_booking(draft("BK-DUP", 1_000)).await.unwrap();
        assert!(matches!(
            engine.create_booking(draft("BK-DUP", 2_000)).await,
            Err(EngineError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_payment_scenario() {
        let engine = engine();
        let booking = pending_booking(&engine, "BK-PAY", 10_000).await;

        let partial = engine
            .submit_payment(cash(booking.id, PaymentKind::Partial, Some(4_000)))
            .await
            .unwrap();
        assert_eq!(partial.status(), SubmissionStatus::Pending);

        let before = engine.get_reconciliation(booking.id).await.unwrap();
        assert_eq!(before.verified_paid, Money::ZERO);
        assert_eq!(before.pending_amount, Money::from_major(4_000).unwrap());

        engine
            .verify_payment(partial.id, ReviewOutcome::Verified)
            .await
            .unwrap();
        let view = engine.get_reconciliation(booking.id).await.unwrap();
        assert_eq!(view.verified_paid, Money::from_major(4_000).unwrap());
        assert_eq!(view.balance, Money::from_major(6_000).unwrap());
        assert_eq!(view.progress_percent, 40);
        assert_eq!(view.payment_state, PaymentState::Partial);

        let full = engine
            .submit_payment(cash(booking.id, PaymentKind::Full, None))
            .await
            .unwrap();
        assert_eq!(full.amount, Money::from_major(6_000).unwrap());
        engine
            .verify_payment(full.id, ReviewOutcome::Verified)
            .await
            .unwrap();

        let view = engine.get_reconciliation(booking.id).await.unwrap();
        assert_eq!(view.verified_paid, Money::from_major(10_000).unwrap());
        assert_eq!(view.balance, Money::ZERO);
        assert_eq!(view.progress_percent, 100);
        assert_eq!(view.payment_state, PaymentState::FullyPaid);
        assert!(view.fully_paid);
    }

    #[tokio::test]
    async fn test_overpayment_guard_on_verification() {
        let engine = engine();
        let booking = pending_booking(&engine, "BK-OVER", 10_000).await;

        // Both fit the balance when submitted; only one can be verified.
        let first = engine
            .submit_payment(cash(booking.id, PaymentKind::Partial, Some(7_000)))
            .await
            .unwrap();
        let second = engine
            .submit_payment(cash(booking.id, PaymentKind::Partial, Some(7_000)))
            .await
            .unwrap();

        engine
            .verify_payment(first.id, ReviewOutcome::Verified)
            .await
            .unwrap();
        assert!(matches!(
            engine.verify_payment(second.id, ReviewOutcome::Verified).await,
            Err(EngineError::OverpaymentGuard { .. })
        ));

        // The refused verification left the submission pending.
        let submissions = engine.list_submissions(booking.id).await.unwrap();
        let second = submissions.iter().find(|s| s.id == second.id).unwrap();
        assert_eq!(second.status(), SubmissionStatus::Pending);
        engine
            .verify_payment(second.id, ReviewOutcome::Rejected)
            .await
            .unwrap();

        let view = engine.get_reconciliation(booking.id).await.unwrap();
        assert_eq!(view.balance, Money::from_major(3_000).unwrap());
    }

    #[tokio::test]
    async fn test_tolerated_overpayment_becomes_credit() {
        let engine = engine().with_policy(PaymentPolicy {
            overpayment_tolerance_bps: 1_000,
            ..PaymentPolicy::default()
        });
        let booking = pending_booking(&engine, "BK-CREDIT", 10_000).await;

        let first = engine
            .submit_payment(cash(booking.id, PaymentKind::Partial, Some(6_000)))
            .await
            .unwrap();
        let second = engine
            .submit_payment(cash(booking.id, PaymentKind::Partial, Some(5_000)))
            .await
            .unwrap();
        engine.verify_payment(first.id, ReviewOutcome::Verified).await.unwrap();
        engine.verify_payment(second.id, ReviewOutcome::Verified).await.unwrap();

        let view = engine.get_reconciliation(booking.id).await.unwrap();
        assert_eq!(view.balance, Money::ZERO);
        assert_eq!(view.credit, Money::from_major(1_000).unwrap());
        assert_eq!(view.progress_percent, 100);
        assert!(view.fully_paid);
    }

    #[tokio::test]
    async fn test_gcash_requires_proof() {
        let engine = engine();
        let booking = pending_booking(&engine, "BK-GCASH", 5_000).await;

        let mut request = cash(booking.id, PaymentKind::Full, None);
        request.method = PaymentMethod::Gcash;
        assert!(matches!(
            engine.submit_payment(request.clone()).await,
            Err(EngineError::MissingProof)
        ));

        request.proof = Some(ProofRef("proofs/receipt-1.png".to_string()));
        let submission = engine.submit_payment(request).await.unwrap();
        assert_eq!(submission.amount, Money::from_major(5_000).unwrap());
    }

    #[tokio::test]
    async fn test_payments_refused_for_drafts() {
        let engine = engine();
        let booking = engine.create_booking(draft("BK-DRAFT", 5_000)).await.unwrap();
        assert!(matches!(
            engine
                .submit_payment(cash(booking.id, PaymentKind::Full, None))
                .await,
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_edit_total_below_verified_is_refused() {
        let engine = engine();
        let booking = pending_booking(&engine, "BK-EDIT", 10_000).await;
        let paid = engine
            .submit_payment(cash(booking.id, PaymentKind::Partial, Some(6_000)))
            .await
            .unwrap();
        engine.verify_payment(paid.id, ReviewOutcome::Verified).await.unwrap();

        assert!(matches!(
            engine
                .edit_total_amount(booking.id, Money::from_major(5_000).unwrap())
                .await,
            Err(EngineError::OverpaymentGuard { .. })
        ));

        let edited = engine
            .edit_total_amount(booking.id, Money::from_major(8_000).unwrap())
            .await
            .unwrap();
        assert_eq!(edited.total_amount(), Money::from_major(8_000).unwrap());

        let view = engine.get_reconciliation(booking.id).await.unwrap();
        assert_eq!(view.balance, Money::from_major(2_000).unwrap());
        assert_eq!(view.progress_percent, 75);
    }

    #[tokio::test]
    async fn test_audit_trail_skips_idempotent_retries() {
        let log = InMemoryAuditLog::new();
        let engine = engine().with_audit(Box::new(log.clone()));
        let booking = pending_booking(&engine, "BK-AUDIT", 1_000).await;

        engine.approve_booking(booking.id).await.unwrap();
        let again = engine.approve_booking(booking.id).await.unwrap();
        assert_eq!(again.status(), BookingStatus::Confirmed);

        let kinds: Vec<AuditKind> = log.events().await.into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AuditKind::BookingCreated {
                    code: "BK-AUDIT".to_string()
                },
                AuditKind::BookingSubmitted,
                AuditKind::BookingApproved,
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let engine = engine();
        let draft_booking = engine.create_booking(draft("BK-DEL", 1_000)).await.unwrap();
        engine.delete_booking(draft_booking.id).await.unwrap();
        assert!(matches!(
            engine.get_booking(draft_booking.id).await,
            Err(EngineError::NotFound(_))
        ));

        let confirmed = pending_booking(&engine, "BK-KEEP", 1_000).await;
        engine.approve_booking(confirmed.id).await.unwrap();
        assert!(matches!(
            engine.delete_booking(confirmed.id).await,
            Err(EngineError::InvalidTransition { .. })
        ));
        assert!(engine.find_by_code("BK-KEEP").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let engine = engine();
        assert!(matches!(
            engine.approve_booking(BookingId::new()).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            engine
                .verify_payment(SubmissionId::new(), ReviewOutcome::Verified)
                .await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            engine.get_reconciliation(BookingId::new()).await,
            Err(EngineError::NotFound(_))
        ));
    }
}
