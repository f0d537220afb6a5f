use crate::domain::audit::AuditEvent;
use crate::domain::booking::{Booking, BookingId};
use crate::domain::payment::{PaymentSubmission, SubmissionId};
use crate::domain::ports::{AuditSink, BookingStore, SubmissionStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for bookings.
///
/// Uses `Arc<RwLock<HashMap<BookingId, Booking>>>` to allow shared concurrent access.
/// Ideal for testing or single-run batches where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingStore {
    /// Creates a new, empty in-memory booking store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn store(&self, booking: Booking) -> Result<()> {
        let mut bookings = self.bookings.write().await;
        bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.values().find(|b| b.code == code).cloned())
    }

    async fn remove(&self, id: BookingId) -> Result<()> {
        let mut bookings = self.bookings.write().await;
        bookings.remove(&id);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut all: Vec<Booking> = bookings.values().cloned().collect();
        all.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then(a.code.cmp(&b.code)));
        Ok(all)
    }
}

/// A thread-safe in-memory store for payment submissions.
#[derive(Default, Clone)]
pub struct InMemorySubmissionStore {
    submissions: Arc<RwLock<HashMap<SubmissionId, PaymentSubmission>>>,
}

impl InMemorySubmissionStore {
    /// Creates a new, empty in-memory submission store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn store(&self, submission: PaymentSubmission) -> Result<()> {
        let mut submissions = self.submissions.write().await;
        submissions.insert(submission.id, submission);
        Ok(())
    }

    async fn get(&self, id: SubmissionId) -> Result<Option<PaymentSubmission>> {
        let submissions = self.submissions.read().await;
        Ok(submissions.get(&id).cloned())
    }

    async fn for_booking(&self, booking_id: BookingId) -> Result<Vec<PaymentSubmission>> {
        let submissions = self.submissions.read().await;
        let mut owned: Vec<PaymentSubmission> = submissions
            .values()
            .filter(|s| s.booking_id == booking_id)
            .cloned()
            .collect();
        owned.sort_by_key(PaymentSubmission::submitted_at);
        Ok(owned)
    }
}

/// Collects audit events in memory. Clones share the same log.
#[derive(Default, Clone)]
pub struct InMemoryAuditLog {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, event: AuditEvent) {
        self.events.write().await.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::AuditKind;
    use crate::domain::booking::{BookingDraft, ItineraryRef};
    use crate::domain::money::Money;
    use crate::domain::payment::{
        AcceptedAmount, PaymentKind, PaymentMethod, PaymentRequest,
    };
    use chrono::{Duration, Utc};

    fn booking(code: &str) -> Booking {
        let draft = BookingDraft {
            customer_name: "Ana Reyes".to_string(),
            contact: "ana@example.com".to_string(),
            itinerary: ItineraryRef("siargao-4d".to_string()),
            travelers: 3,
            total_amount: Money::from_major(18_000).unwrap(),
            ..BookingDraft::default()
        };
        Booking::new(BookingId::new(), code.to_string(), draft, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_booking_store() {
        let store = InMemoryBookingStore::new();
        let booking = booking("BK-100");

        store.store(booking.clone()).await.unwrap();

        let retrieved = store.get(booking.id).await.unwrap().unwrap();
        assert_eq!(retrieved, booking);
        let by_code = store.get_by_code("BK-100").await.unwrap().unwrap();
        assert_eq!(by_code.id, booking.id);
        assert!(store.get_by_code("BK-404").await.unwrap().is_none());

        store.remove(booking.id).await.unwrap();
        assert!(store.get(booking.id).await.unwrap().is_none());
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_submission_store_orders_by_submission_time() {
        let store = InMemorySubmissionStore::new();
        let booking_id = BookingId::new();
        let other_booking = BookingId::new();
        let now = Utc::now();

        let make = |booking_id, major, at| {
            let amount = Money::from_major(major).unwrap();
            PaymentSubmission::new(
                PaymentRequest {
                    booking_id,
                    amount: Some(amount),
                    method: PaymentMethod::Cash,
                    kind: PaymentKind::Partial,
                    proof: None,
                },
                AcceptedAmount {
                    amount,
                    missing_proof: false,
                },
                at,
            )
        };

        let later = make(booking_id, 200, now + Duration::seconds(5));
        let earlier = make(booking_id, 100, now);
        store.store(later.clone()).await.unwrap();
        store.store(earlier.clone()).await.unwrap();
        store.store(make(other_booking, 300, now)).await.unwrap();

        let owned = store.for_booking(booking_id).await.unwrap();
        assert_eq!(owned, vec![earlier.clone(), later]);
        assert_eq!(store.get(earlier.id).await.unwrap().unwrap(), earlier);
    }

    #[tokio::test]
    async fn test_audit_log_shares_events_between_clones() {
        let log = InMemoryAuditLog::new();
        let handle = log.clone();
        log.record(AuditEvent::new(
            BookingId::new(),
            Utc::now(),
            AuditKind::BookingApproved,
        ))
        .await;
        assert_eq!(handle.events().await.len(), 1);
    }
}
