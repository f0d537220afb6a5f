#![allow(dead_code)]

use std::fs::File;
use std::io::Error;
use std::path::Path;
use tourdesk::application::engine::BookingEngine;
use tourdesk::domain::booking::{Booking, BookingDraft, BookingId, ItineraryRef};
use tourdesk::domain::money::Money;
use tourdesk::domain::payment::{PaymentKind, PaymentMethod, PaymentRequest, ProofRef};
use tourdesk::infrastructure::in_memory::{InMemoryBookingStore, InMemorySubmissionStore};

pub const HEADER: [&str; 16] = [
    "action",
    "booking",
    "payment",
    "amount",
    "method",
    "kind",
    "outcome",
    "proof",
    "reason",
    "resolution",
    "customer",
    "contact",
    "itinerary",
    "itinerary_kind",
    "travel_date",
    "travelers",
];

pub fn engine() -> BookingEngine {
    BookingEngine::new(
        Box::new(InMemoryBookingStore::new()),
        Box::new(InMemorySubmissionStore::new()),
    )
}

pub fn pesos(major: u64) -> Money {
    Money::from_major(major).unwrap()
}

pub fn draft(code: &str, total: u64) -> BookingDraft {
    BookingDraft {
        code: Some(code.to_string()),
        customer_name: "Rosa Aquino".to_string(),
        contact: "rosa@example.com".to_string(),
        itinerary: ItineraryRef("batanes-4d".to_string()),
        travelers: 3,
        total_amount: pesos(total),
        ..BookingDraft::default()
    }
}

/// Creates and submits a booking so that it is `PENDING`.
pub async fn pending_booking(engine: &BookingEngine, code: &str, total: u64) -> Booking {
    let booking = engine.create_booking(draft(code, total)).await.unwrap();
    engine.submit_booking(booking.id).await.unwrap()
}

pub fn cash_partial(booking_id: BookingId, major: u64) -> PaymentRequest {
    PaymentRequest {
        booking_id,
        amount: Some(pesos(major)),
        method: PaymentMethod::Cash,
        kind: PaymentKind::Partial,
        proof: None,
    }
}

pub fn full(booking_id: BookingId, method: PaymentMethod) -> PaymentRequest {
    PaymentRequest {
        booking_id,
        amount: None,
        method,
        kind: PaymentKind::Full,
        proof: (method == PaymentMethod::Gcash).then(|| ProofRef("proofs/gcash.png".to_string())),
    }
}

/// Writes a command script where every booking is created, submitted and paid in
/// two verified halves.
pub fn generate_script(path: &Path, bookings: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
    wtr.write_record(HEADER)?;

    for i in 1..=bookings {
        let code = format!("BK-{i:04}");
        let first = format!("p{i}-a");
        let second = format!("p{i}-b");
        wtr.write_record([
            "create", &code, "", "2000", "", "", "", "", "", "", "Guest", "guest@example.com",
            "tour-1",
        ])?;
        wtr.write_record(["submit", &code])?;
        wtr.write_record(["pay", &code, &first, "1000", "cash", "partial"])?;
        wtr.write_record(["review", &code, &first, "", "", "", "verified"])?;
        wtr.write_record(["pay", &code, &second, "", "cash", "full"])?;
        wtr.write_record(["review", &code, &second, "", "", "", "verified"])?;
        wtr.write_record(["approve", &code])?;
    }

    wtr.flush()?;
    Ok(())
}
