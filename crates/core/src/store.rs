use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::booking::{BookingId, BookingRecord, BookingStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("booking id {0} already exists")]
    DuplicateKey(BookingId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The only mutation a committed booking accepts. It applies only while the
/// stored record is still in `expected` status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingUpdate {
    pub expected: BookingStatus,
    pub status: BookingStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl BookingUpdate {
    pub fn cancelled(at: DateTime<Utc>) -> Self {
        Self {
            expected: BookingStatus::Confirmed,
            status: BookingStatus::Cancelled,
            cancelled_at: Some(at),
        }
    }
}

/// Key-value booking storage. Every key is an uppercase `BookingId`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Fails with `StoreError::DuplicateKey` when the id is taken.
    async fn insert(&self, record: &BookingRecord) -> Result<(), StoreError>;
    async fn find_one(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError>;
    /// Returns false when no record with this id is in `update.expected` status.
    async fn update_one(&self, id: &BookingId, update: BookingUpdate) -> Result<bool, StoreError>;
    async fn list_recent(&self, limit: u32) -> Result<Vec<BookingRecord>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<String, BookingRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryBookingStore {
    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, record: &BookingRecord) -> Result<(), StoreError> {
        self.check_available()?;
        let mut bookings = self.bookings.write().await;
        let key = record.booking_id.0.clone();
        if bookings.contains_key(&key) {
            return Err(StoreError::DuplicateKey(record.booking_id.clone()));
        }
        bookings.insert(key, record.clone());
        Ok(())
    }

    async fn find_one(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError> {
        self.check_available()?;
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id.0).cloned())
    }

    async fn update_one(&self, id: &BookingId, update: BookingUpdate) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id.0) {
            Some(record) if record.status == update.expected => {
                record.status = update.status;
                record.cancelled_at = update.cancelled_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<BookingRecord>, StoreError> {
        self.check_available()?;
        let bookings = self.bookings.read().await;
        let mut records: Vec<BookingRecord> = bookings.values().cloned().collect();
        records.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| a.booking_id.cmp(&b.booking_id))
        });
        records.truncate(limit as usize);
        Ok(records)
    }
}
