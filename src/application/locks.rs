use crate::domain::booking::BookingId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed table of per-booking async locks.
///
/// Mutations on the same booking queue behind one another; different bookings
/// never contend. Entries are dropped once no task holds or waits on them.
#[derive(Default)]
pub struct BookingLocks {
    locks: Mutex<HashMap<BookingId, Arc<AsyncMutex<()>>>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: BookingId) -> BookingGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id).or_default())
        };
        let guard = lock.lock_owned().await;
        BookingGuard {
            table: self,
            id,
            guard: Some(guard),
        }
    }

    /// Number of bookings with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one booking until dropped.
pub struct BookingGuard<'a> {
    table: &'a BookingLocks,
    id: BookingId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BookingGuard<'_> {
    fn drop(&mut self) {
        // Release first so the strong count only reflects the table and waiters.
        self.guard.take();
        let mut locks = self
            .table
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}
