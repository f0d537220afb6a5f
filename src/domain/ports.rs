use super::audit::AuditEvent;
use super::booking::{Booking, BookingId};
use super::payment::{PaymentSubmission, SubmissionId};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn store(&self, booking: Booking) -> Result<()>;
    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;
    async fn get_by_code(&self, code: &str) -> Result<Option<Booking>>;
    async fn remove(&self, id: BookingId) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<Booking>>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn store(&self, submission: PaymentSubmission) -> Result<()>;
    async fn get(&self, id: SubmissionId) -> Result<Option<PaymentSubmission>>;
    /// All submissions of a booking, oldest first.
    async fn for_booking(&self, booking_id: BookingId) -> Result<Vec<PaymentSubmission>>;
}

/// Fire-and-forget sink for committed changes. Failures stay inside the sink.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

pub type BookingStoreBox = Box<dyn BookingStore>;
pub type SubmissionStoreBox = Box<dyn SubmissionStore>;
pub type AuditSinkBox = Box<dyn AuditSink>;
