mod common;

use common::{draft, engine, pending_booking};
use tourdesk::domain::booking::{BookingAction, BookingStatus};
use tourdesk::error::EngineError;

#[tokio::test]
async fn test_rejection_resolution_scenario() {
    let engine = engine();
    let booking = pending_booking(&engine, "BK-1001", 10_000).await;

    let rejected = engine
        .reject_booking(booking.id, "incomplete docs", "upload valid ID")
        .await
        .unwrap();
    assert_eq!(rejected.status(), BookingStatus::Rejected);
    assert_eq!(rejected.is_resolved(), Some(false));

    let err = engine.reconsider_booking(booking.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotResolved(_)));

    let resolved = engine.mark_resolved(booking.id).await.unwrap();
    assert_eq!(resolved.is_resolved(), Some(true));

    let reconsidered = engine.reconsider_booking(booking.id).await.unwrap();
    assert_eq!(reconsidered.status(), BookingStatus::Pending);
    assert_eq!(reconsidered.is_resolved(), None);
    assert!(reconsidered.rejection().is_none());
}

#[tokio::test]
async fn test_approval_is_idempotent() {
    let engine = engine();
    let booking = pending_booking(&engine, "BK-1002", 5_000).await;

    let first = engine.approve_booking(booking.id).await.unwrap();
    let second = engine.approve_booking(booking.id).await.unwrap();

    assert_eq!(first.status(), BookingStatus::Confirmed);
    assert_eq!(second.status(), BookingStatus::Confirmed);
    assert_eq!(first.version(), second.version());
}

#[tokio::test]
async fn test_reopening_a_resolved_rejection() {
    let engine = engine();
    let booking = pending_booking(&engine, "BK-1003", 5_000).await;
    engine
        .reject_booking(booking.id, "passport expired", "renew passport")
        .await
        .unwrap();
    engine.mark_resolved(booking.id).await.unwrap();

    let reopened = engine
        .mark_unresolved(booking.id, "renewal pending", "send receipt of renewal")
        .await
        .unwrap();
    let rejection = reopened.rejection().unwrap();
    assert!(!rejection.is_resolved());
    assert_eq!(rejection.reason(), "renewal pending");
    assert_eq!(rejection.resolution(), "send receipt of renewal");

    assert!(matches!(
        engine.reconsider_booking(booking.id).await,
        Err(EngineError::NotResolved(_))
    ));
}

#[tokio::test]
async fn test_invalid_transitions_leave_booking_untouched() {
    let engine = engine();
    let booking = engine.create_booking(draft("BK-1004", 5_000)).await.unwrap();

    let err = engine.approve_booking(booking.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition {
            action: BookingAction::Approve,
            ..
        }
    ));
    assert!(matches!(
        engine.reject_booking(booking.id, "late", "rebook").await,
        Err(EngineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        engine.mark_resolved(booking.id).await,
        Err(EngineError::InvalidTransition { .. })
    ));

    let stored = engine.get_booking(booking.id).await.unwrap();
    assert_eq!(stored, booking);
}

#[tokio::test]
async fn test_confirmed_booking_cannot_be_cancelled_or_deleted() {
    let engine = engine();
    let booking = pending_booking(&engine, "BK-1005", 5_000).await;
    engine.approve_booking(booking.id).await.unwrap();

    assert!(matches!(
        engine.cancel_booking(booking.id).await,
        Err(EngineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        engine.delete_booking(booking.id).await,
        Err(EngineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        engine.reject_booking(booking.id, "late", "rebook").await,
        Err(EngineError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_cancel_rejected_booking() {
    let engine = engine();
    let booking = pending_booking(&engine, "BK-1006", 5_000).await;
    engine
        .reject_booking(booking.id, "no slots", "choose another date")
        .await
        .unwrap();

    let cancelled = engine.cancel_booking(booking.id).await.unwrap();
    assert_eq!(cancelled.status(), BookingStatus::Cancelled);
    assert!(cancelled.rejection().is_none());

    let again = engine.cancel_booking(booking.id).await.unwrap();
    assert_eq!(again.version(), cancelled.version());

    assert!(matches!(
        engine.submit_booking(booking.id).await,
        Err(EngineError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_incomplete_draft_cannot_be_submitted() {
    let engine = engine();
    let mut incomplete = draft("BK-1007", 5_000);
    incomplete.contact = String::new();
    let booking = engine.create_booking(incomplete).await.unwrap();

    assert!(matches!(
        engine.submit_booking(booking.id).await,
        Err(EngineError::ValidationError(_))
    ));
    assert_eq!(
        engine.get_booking(booking.id).await.unwrap().status(),
        BookingStatus::Draft
    );
}

#[tokio::test]
async fn test_delete_rejected_booking_frees_its_code() {
    let engine = engine();
    let booking = pending_booking(&engine, "BK-1008", 5_000).await;
    engine
        .reject_booking(booking.id, "duplicate request", "use BK-1009")
        .await
        .unwrap();

    engine.delete_booking(booking.id).await.unwrap();
    assert!(matches!(
        engine.find_by_code("BK-1008").await,
        Err(EngineError::NotFound(_))
    ));
    assert!(engine.create_booking(draft("BK-1008", 1_000)).await.is_ok());
}
