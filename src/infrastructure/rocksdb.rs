use crate::domain::booking::{Booking, BookingId};
use crate::domain::payment::{PaymentSubmission, SubmissionId};
use crate::domain::ports::{BookingStore, SubmissionStore};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for booking records, keyed by booking id.
pub const CF_BOOKINGS: &str = "bookings";
/// Column Family mapping booking codes to booking ids.
pub const CF_BOOKING_CODES: &str = "booking_codes";
/// Column Family for payment submissions, keyed by booking id ++ submission id.
pub const CF_SUBMISSIONS: &str = "submissions";
/// Column Family mapping submission ids to their owning booking id.
pub const CF_SUBMISSION_INDEX: &str = "submission_index";

/// A persistent store implementation using RocksDB.
///
/// Bookings and submissions live in separate Column Families. Writes touching
/// more than one key (a record plus its index entry) go through a single
/// `WriteBatch`, so a crash never leaves an index pointing at nothing.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating the
    /// column families on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_BOOKINGS, CF_BOOKING_CODES, CF_SUBMISSIONS, CF_SUBMISSION_INDEX]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            EngineError::InternalError(Box::new(std::io::Error::other(format!(
                "Column family '{name}' not found"
            ))))
        })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        EngineError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        EngineError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

fn submission_key(booking_id: &BookingId, submission_id: &SubmissionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(booking_id.as_bytes());
    key.extend_from_slice(submission_id.as_bytes());
    key
}

fn booking_id_from(bytes: &[u8]) -> Result<BookingId> {
    let raw: [u8; 16] = bytes.try_into().map_err(|_| {
        EngineError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Malformed booking id in index",
        )))
    })?;
    Ok(BookingId::from_bytes(raw))
}

#[async_trait]
impl BookingStore for RocksDBStore {
    async fn store(&self, booking: Booking) -> Result<()> {
        let bookings = self.cf(CF_BOOKINGS)?;
        let codes = self.cf(CF_BOOKING_CODES)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(bookings, booking.id.as_bytes(), encode(&booking)?);
        batch.put_cf(codes, booking.code.as_bytes(), booking.id.as_bytes());
        self.db.write(batch)?;

        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let cf = self.cf(CF_BOOKINGS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Booking>> {
        let indexed = self.db.get_cf(self.cf(CF_BOOKING_CODES)?, code.as_bytes())?;
        match indexed {
            Some(bytes) => BookingStore::get(self, booking_id_from(&bytes)?).await,
            None => Ok(None),
        }
    }

    async fn remove(&self, id: BookingId) -> Result<()> {
        let Some(booking) = BookingStore::get(self, id).await? else {
            return Ok(());
        };

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_BOOKINGS)?, id.as_bytes());
        batch.delete_cf(self.cf(CF_BOOKING_CODES)?, booking.code.as_bytes());
        self.db.write(batch)?;

        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Booking>> {
        let cf = self.cf(CF_BOOKINGS)?;

        let mut bookings = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            bookings.push(decode::<Booking>(&value)?);
        }
        bookings.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then(a.code.cmp(&b.code)));

        Ok(bookings)
    }
}

#[async_trait]
impl SubmissionStore for RocksDBStore {
    async fn store(&self, submission: PaymentSubmission) -> Result<()> {
        let submissions = self.cf(CF_SUBMISSIONS)?;
        let index = self.cf(CF_SUBMISSION_INDEX)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            submissions,
            submission_key(&submission.booking_id, &submission.id),
            encode(&submission)?,
        );
        batch.put_cf(index, submission.id.as_bytes(), submission.booking_id.as_bytes());
        self.db.write(batch)?;

        Ok(())
    }

    async fn get(&self, id: SubmissionId) -> Result<Option<PaymentSubmission>> {
        let index = self.cf(CF_SUBMISSION_INDEX)?;
        let Some(owner) = self.db.get_cf(index, id.as_bytes())? else {
            return Ok(None);
        };
        let booking_id = booking_id_from(&owner)?;

        let cf = self.cf(CF_SUBMISSIONS)?;
        match self.db.get_cf(cf, submission_key(&booking_id, &id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn for_booking(&self, booking_id: BookingId) -> Result<Vec<PaymentSubmission>> {
        let cf = self.cf(CF_SUBMISSIONS)?;
        let prefix: &[u8] = booking_id.as_bytes();

        let mut submissions = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            submissions.push(decode::<PaymentSubmission>(&value)?);
        }
        submissions.sort_by_key(PaymentSubmission::submitted_at);

        Ok(submissions)
    }
}
