use crate::domain::audit::{AuditEvent, AuditKind};
use crate::domain::ports::AuditSink;
use async_trait::async_trait;

/// Emits audit events as structured `tracing` records under the `audit` target.
#[derive(Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        match &event.kind {
            AuditKind::BookingRejected { reason, resolution }
            | AuditKind::RejectionReopened { reason, resolution } => {
                tracing::info!(
                    target: "audit",
                    booking_id = %event.booking_id,
                    at = %event.at,
                    reason = reason.as_str(),
                    resolution = resolution.as_str(),
                    "{}",
                    describe(&event.kind)
                );
            }
            AuditKind::TotalAmountEdited { from, to } => {
                tracing::info!(
                    target: "audit",
                    booking_id = %event.booking_id,
                    at = %event.at,
                    %from,
                    %to,
                    "{}",
                    describe(&event.kind)
                );
            }
            AuditKind::PaymentSubmitted {
                submission_id,
                amount,
                method,
            } => {
                tracing::info!(
                    target: "audit",
                    booking_id = %event.booking_id,
                    at = %event.at,
                    %submission_id,
                    %amount,
                    ?method,
                    "{}",
                    describe(&event.kind)
                );
            }
            AuditKind::PaymentReviewed {
                submission_id,
                outcome,
            } => {
                tracing::info!(
                    target: "audit",
                    booking_id = %event.booking_id,
                    at = %event.at,
                    %submission_id,
                    ?outcome,
                    "{}",
                    describe(&event.kind)
                );
            }
            kind => {
                tracing::info!(
                    target: "audit",
                    booking_id = %event.booking_id,
                    at = %event.at,
                    "{}",
                    describe(kind)
                );
            }
        }
    }
}

fn describe(kind: &AuditKind) -> &'static str {
    match kind {
        AuditKind::BookingCreated { .. } => "booking created",
        AuditKind::BookingSubmitted => "booking submitted for approval",
        AuditKind::BookingApproved => "booking approved",
        AuditKind::BookingRejected { .. } => "booking rejected",
        AuditKind::BookingReconsidered => "booking returned to approval queue",
        AuditKind::RejectionResolved => "rejection marked resolved",
        AuditKind::RejectionReopened { .. } => "rejection marked unresolved",
        AuditKind::BookingCancelled => "booking cancelled",
        AuditKind::BookingDeleted => "booking deleted",
        AuditKind::TotalAmountEdited { .. } => "total amount edited",
        AuditKind::PaymentSubmitted { .. } => "payment submitted",
        AuditKind::PaymentReviewed { .. } => "payment reviewed",
    }
}
