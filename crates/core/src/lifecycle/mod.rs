//! Booking lifecycle: `Collecting -> Confirmed -> Cancelled`.
//!
//! A draft becomes a record only through [`BookingLifecycle::confirm`]. The
//! record is inserted under a freshly generated id, retried on key collision,
//! and handed to the post-commit hook once it is durable.

pub mod id;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::booking::{BookingId, BookingRecord, BookingStatus};
use crate::domain::draft::BookingDraft;
use crate::errors::{ApplicationError, DomainError};
use crate::notification::{BookingCommitHook, DisabledNotifications, NotificationOutcome};
use crate::pricing::{stay_cost, trip_totals, PricingEngine};
use crate::store::{BookingStore, BookingUpdate, StoreError};
use id::{BookingIdGenerator, RandomBookingIdGenerator};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub stay_nights: u32,
    pub refund_pct: u8,
    pub id_retry_limit: u32,
    pub notification_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            stay_nights: 3,
            refund_pct: 80,
            id_retry_limit: 3,
            notification_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub record: BookingRecord,
    pub attempts: u32,
    pub notification: NotificationOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancellationOutcome {
    Cancelled { record: BookingRecord, refund: Decimal },
    AlreadyCancelled { record: BookingRecord },
}

impl CancellationOutcome {
    pub fn record(&self) -> &BookingRecord {
        match self {
            Self::Cancelled { record, .. } | Self::AlreadyCancelled { record } => record,
        }
    }
}

pub fn refund_amount(total: Decimal, refund_pct: u8) -> Decimal {
    (total * Decimal::from(refund_pct) / Decimal::from(100)).round_dp(2)
}

pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
    pricing: Arc<dyn PricingEngine>,
    ids: Arc<dyn BookingIdGenerator>,
    commit_hook: Arc<dyn BookingCommitHook>,
    settings: LifecycleSettings,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn BookingStore>, pricing: Arc<dyn PricingEngine>) -> Self {
        Self {
            store,
            pricing,
            ids: Arc::new(RandomBookingIdGenerator),
            commit_hook: Arc::new(DisabledNotifications),
            settings: LifecycleSettings::default(),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn BookingIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_commit_hook(mut self, hook: Arc<dyn BookingCommitHook>) -> Self {
        self.commit_hook = hook;
        self
    }

    pub fn with_settings(mut self, settings: LifecycleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub fn pricing(&self) -> &dyn PricingEngine {
        self.pricing.as_ref()
    }

    pub async fn confirm(
        &self,
        draft: &mut BookingDraft,
    ) -> Result<Confirmation, ApplicationError> {
        let mut record = self.price_draft(draft)?;

        let attempts = self.insert_with_fresh_id(&mut record).await?;
        draft.mark_confirmed(record.booking_id.clone());

        tracing::info!(
            event_name = "booking.confirmed",
            booking_id = %record.booking_id,
            destination = %record.destination,
            total_cost = %record.total_cost,
            attempts,
            "booking committed"
        );

        let notification = match tokio::time::timeout(
            self.settings.notification_timeout,
            self.commit_hook.after_commit(&record),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    event_name = "notification.timed_out",
                    booking_id = %record.booking_id,
                    timeout_secs = self.settings.notification_timeout.as_secs(),
                    "post-commit notification did not finish in time"
                );
                NotificationOutcome::TimedOut
            }
        };

        tracing::info!(
            event_name = "booking.notification_observed",
            booking_id = %record.booking_id,
            outcome = notification.as_str(),
            "post-commit hook finished"
        );

        Ok(Confirmation { record, attempts, notification })
    }

    /// Builds the record a confirmation would store, without storing it.
    pub fn price_draft(&self, draft: &BookingDraft) -> Result<BookingRecord, ApplicationError> {
        let ready = draft.ready()?;
        if let Some(existing) = draft.booking_id() {
            return Err(DomainError::AlreadyConfirmed { booking_id: existing.to_string() }.into());
        }

        let travelers = ready.travelers.total();
        let transport = self.pricing.quote_transport(
            ready.origin,
            ready.destination,
            ready.travel_mode,
            travelers,
        )?;
        let hotel_cost =
            stay_cost(ready.hotel.price_per_night, self.settings.stay_nights, travelers);
        let totals = trip_totals(&transport, hotel_cost);

        Ok(BookingRecord {
            booking_id: BookingId(String::new()),
            customer: ready.customer,
            origin: ready.origin.to_string(),
            destination: ready.destination.to_string(),
            travel_mode: ready.travel_mode,
            hotel_name: ready.hotel.name.clone(),
            hotel_rating: ready.hotel.rating,
            hotel_amenities: ready.hotel.amenities.clone(),
            hotel_description: ready.hotel.description.clone(),
            hotel_price_per_night: ready.hotel.price_per_night,
            dates: ready.dates.map(str::to_string),
            travelers,
            travel_cost: totals.travel_cost,
            hotel_cost: totals.hotel_cost,
            total_cost: totals.total_cost,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
            cancelled_at: None,
        })
    }

    async fn insert_with_fresh_id(
        &self,
        record: &mut BookingRecord,
    ) -> Result<u32, ApplicationError> {
        let limit = self.settings.id_retry_limit.max(1);
        for attempt in 1..=limit {
            record.booking_id = self.ids.next_id();
            match self.store.insert(record).await {
                Ok(()) => return Ok(attempt),
                Err(StoreError::DuplicateKey(id)) => {
                    tracing::warn!(
                        event_name = "booking.id_collision",
                        booking_id = %id,
                        attempt,
                        limit,
                        "generated booking id already exists; regenerating"
                    );
                }
                Err(error) => return Err(persistence("insert", &record.booking_id, error)),
            }
        }

        tracing::error!(
            event_name = "booking.id_exhausted",
            attempts = limit,
            "could not allocate a unique booking id"
        );
        Err(ApplicationError::PersistenceExhausted { attempts: limit })
    }

    pub async fn retrieve(&self, raw_id: &str) -> Result<BookingRecord, ApplicationError> {
        let id = parse_id(raw_id)?;
        self.store
            .find_one(&id)
            .await
            .map_err(|error| persistence("find_one", &id, error))?
            .ok_or_else(|| DomainError::BookingNotFound { booking_id: id.to_string() }.into())
    }

    /// Cancels once. A second call reports `AlreadyCancelled` and computes no refund.
    pub async fn cancel(&self, raw_id: &str) -> Result<CancellationOutcome, ApplicationError> {
        let mut record = self.retrieve(raw_id).await?;
        if record.is_cancelled() {
            tracing::info!(
                event_name = "booking.cancel_repeated",
                booking_id = %record.booking_id,
                "booking was already cancelled"
            );
            return Ok(CancellationOutcome::AlreadyCancelled { record });
        }

        record.transition_to(BookingStatus::Cancelled)?;
        let now = Utc::now();
        let matched = self
            .store
            .update_one(&record.booking_id, BookingUpdate::cancelled(now))
            .await
            .map_err(|error| persistence("update_one", &record.booking_id, error))?;
        if !matched {
            return self.resolve_lost_cancel(record.booking_id).await;
        }
        record.cancelled_at = Some(now);

        let refund = refund_amount(record.total_cost, self.settings.refund_pct);
        tracing::info!(
            event_name = "booking.cancelled",
            booking_id = %record.booking_id,
            refund = %refund,
            "booking cancelled"
        );
        Ok(CancellationOutcome::Cancelled { record, refund })
    }

    /// The conditional update matched nothing: another caller cancelled first,
    /// or the record vanished.
    async fn resolve_lost_cancel(
        &self,
        id: BookingId,
    ) -> Result<CancellationOutcome, ApplicationError> {
        let current = self
            .store
            .find_one(&id)
            .await
            .map_err(|error| persistence("find_one", &id, error))?;
        match current {
            Some(record) if record.is_cancelled() => {
                tracing::info!(
                    event_name = "booking.cancel_raced",
                    booking_id = %record.booking_id,
                    "booking was cancelled concurrently"
                );
                Ok(CancellationOutcome::AlreadyCancelled { record })
            }
            _ => Err(DomainError::BookingNotFound { booking_id: id.to_string() }.into()),
        }
    }

    pub async fn list_recent(&self, limit: u32) -> Result<Vec<BookingRecord>, ApplicationError> {
        self.store.list_recent(limit).await.map_err(|error| {
            tracing::error!(
                event_name = "booking.store_failed",
                operation = "list_recent",
                error = %error
            );
            ApplicationError::Persistence(error.to_string())
        })
    }
}

fn parse_id(raw: &str) -> Result<BookingId, DomainError> {
    let id = BookingId::normalize(raw);
    if id.as_str().is_empty() {
        return Err(DomainError::EmptyValue { field: "booking id".to_string() });
    }
    Ok(id)
}

fn persistence(operation: &str, id: &BookingId, error: StoreError) -> ApplicationError {
    tracing::error!(
        event_name = "booking.store_failed",
        operation,
        booking_id = %id,
        error = %error,
        "booking store call failed"
    );
    ApplicationError::Persistence(error.to_string())
}
