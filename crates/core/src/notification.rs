//! Post-commit confirmation notices.
//!
//! A notice is rendered from the committed record and handed to a
//! `NotificationTransport`. Transport failures are logged and reported as a
//! `NotificationOutcome`; they never undo or fail the booking itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::domain::booking::{BookingId, BookingRecord};

const CONFIRMATION_TEMPLATE: &str = "booking_confirmation.txt";
const BRAND: &str = "Yatra Travels";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("template error: {0}")]
    Template(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub booking_id: BookingId,
    pub from: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Delivered,
    Failed,
    Skipped,
    TimedOut,
}

impl NotificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::TimedOut => "timed_out",
        }
    }

    /// Informational sentence appended to the confirmation reply.
    pub fn reply_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Delivered => Some("A confirmation has been sent to your email."),
            Self::Failed => {
                Some("We could not send the confirmation email, but your booking is saved.")
            }
            Self::TimedOut => Some(
                "The confirmation email is taking longer than usual, but your booking is saved.",
            ),
            Self::Skipped => None,
        }
    }
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(
        &self,
        address: &str,
        message: &NotificationMessage,
    ) -> Result<(), NotificationError>;
}

/// Runs after a booking has been durably stored.
#[async_trait]
pub trait BookingCommitHook: Send + Sync {
    async fn after_commit(&self, record: &BookingRecord) -> NotificationOutcome;
}

#[derive(Serialize)]
struct ConfirmationView<'a> {
    brand: &'a str,
    booking_id: &'a str,
    status: String,
    booked_on: String,
    customer_name: &'a str,
    customer_phone: &'a str,
    customer_email: &'a str,
    origin: &'a str,
    destination: &'a str,
    travel_mode: &'a str,
    dates: &'a str,
    travelers: u32,
    hotel_name: &'a str,
    hotel_rating: u8,
    stars: String,
    hotel_price_per_night: String,
    hotel_amenities: String,
    hotel_description: &'a str,
    travel_cost: String,
    hotel_cost: String,
    total_cost: String,
}

impl<'a> ConfirmationView<'a> {
    fn from_record(record: &'a BookingRecord) -> Self {
        Self {
            brand: BRAND,
            booking_id: record.booking_id.as_str(),
            status: record.status.as_str().to_ascii_uppercase(),
            booked_on: record.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            customer_name: &record.customer.name,
            customer_phone: &record.customer.phone,
            customer_email: &record.customer.email,
            origin: &record.origin,
            destination: &record.destination,
            travel_mode: record.travel_mode.as_str(),
            dates: record.dates.as_deref().unwrap_or("to be confirmed"),
            travelers: record.travelers,
            hotel_name: &record.hotel_name,
            hotel_rating: record.hotel_rating,
            stars: "*".repeat(usize::from(record.hotel_rating.min(5))),
            hotel_price_per_night: format!("{:.2}", record.hotel_price_per_night),
            hotel_amenities: record.hotel_amenities.join(", "),
            hotel_description: &record.hotel_description,
            travel_cost: format!("{:.2}", record.travel_cost),
            hotel_cost: format!("{:.2}", record.hotel_cost),
            total_cost: format!("{:.2}", record.total_cost),
        }
    }
}

pub struct ConfirmationRenderer {
    tera: Tera,
}

impl ConfirmationRenderer {
    pub fn new() -> Result<Self, NotificationError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            CONFIRMATION_TEMPLATE,
            include_str!("../templates/booking_confirmation.txt"),
        )
        .map_err(|error| NotificationError::Template(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(&self, record: &BookingRecord) -> Result<String, NotificationError> {
        let context = Context::from_serialize(ConfirmationView::from_record(record))
            .map_err(|error| NotificationError::Template(error.to_string()))?;
        self.tera
            .render(CONFIRMATION_TEMPLATE, &context)
            .map_err(|error| NotificationError::Template(error.to_string()))
    }
}

pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
    renderer: ConfirmationRenderer,
    sender_address: String,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        sender_address: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        Ok(Self {
            transport,
            renderer: ConfirmationRenderer::new()?,
            sender_address: sender_address.into(),
        })
    }

    pub fn compose(
        &self,
        record: &BookingRecord,
    ) -> Result<NotificationMessage, NotificationError> {
        Ok(NotificationMessage {
            booking_id: record.booking_id.clone(),
            from: self.sender_address.clone(),
            subject: format!(
                "Booking {} confirmed: {} to {}",
                record.booking_id, record.origin, record.destination
            ),
            body: self.renderer.render(record)?,
        })
    }

    /// Renders and delivers the confirmation. Every error becomes `false`.
    pub async fn send(&self, record: &BookingRecord) -> bool {
        let message = match self.compose(record) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(
                    event_name = "notification.failed",
                    booking_id = %record.booking_id,
                    error = %error,
                    "could not render booking confirmation"
                );
                return false;
            }
        };

        match self.transport.deliver(&record.customer.email, &message).await {
            Ok(()) => {
                tracing::info!(
                    event_name = "notification.delivered",
                    booking_id = %record.booking_id,
                    transport = self.transport.name(),
                    "booking confirmation delivered"
                );
                true
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "notification.failed",
                    booking_id = %record.booking_id,
                    transport = self.transport.name(),
                    error = %error,
                    "booking confirmation could not be delivered"
                );
                false
            }
        }
    }
}

#[async_trait]
impl BookingCommitHook for NotificationDispatcher {
    async fn after_commit(&self, record: &BookingRecord) -> NotificationOutcome {
        if self.send(record).await {
            NotificationOutcome::Delivered
        } else {
            NotificationOutcome::Failed
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledNotifications;

#[async_trait]
impl BookingCommitHook for DisabledNotifications {
    async fn after_commit(&self, record: &BookingRecord) -> NotificationOutcome {
        tracing::debug!(
            event_name = "notification.skipped",
            booking_id = %record.booking_id,
            "notifications disabled"
        );
        NotificationOutcome::Skipped
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTransport {
    sent: Arc<Mutex<Vec<(String, NotificationMessage)>>>,
    failing: Arc<AtomicBool>,
    delay: Option<Duration>,
}

impl InMemoryTransport {
    pub fn failing() -> Self {
        let transport = Self::default();
        transport.failing.store(true, Ordering::SeqCst);
        transport
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<(String, NotificationMessage)> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl NotificationTransport for InMemoryTransport {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn deliver(
        &self,
        address: &str,
        message: &NotificationMessage,
    ) -> Result<(), NotificationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport("simulated outage".to_string()));
        }
        let entry = (address.to_string(), message.clone());
        match self.sent.lock() {
            Ok(mut sent) => sent.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        BookingCommitHook, ConfirmationRenderer, DisabledNotifications, InMemoryTransport,
        NotificationDispatcher, NotificationOutcome,
    };
    use crate::domain::booking::fixtures::record;

    #[test]
    fn confirmation_body_lists_trip_and_costs() {
        let renderer = ConfirmationRenderer::new().expect("template compiles");
        let mut booking = record("AB12CD34", 10_000);
        booking.hotel_amenities = vec!["wifi".to_string(), "pool".to_string()];

        let body = renderer.render(&booking).expect("render");
        assert!(body.contains("Booking ID: AB12CD34"));
        assert!(body.contains("Status: CONFIRMED"));
        assert!(body.contains("From: Mumbai"));
        assert!(body.contains("Rating: *** (3/5)"));
        assert!(body.contains("Amenities: wifi, pool"));
        assert!(body.contains("Total Cost: 10000.00"));
    }

    #[tokio::test]
    async fn dispatcher_delivers_to_customer_email() {
        let transport = InMemoryTransport::default();
        let dispatcher =
            NotificationDispatcher::new(Arc::new(transport.clone()), "bookings@yatra.test")
                .expect("dispatcher");

        let outcome = dispatcher.after_commit(&record("AB12CD34", 10_000)).await;
        assert_eq!(outcome, NotificationOutcome::Delivered);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "asha@example.com");
        assert_eq!(sent[0].1.from, "bookings@yatra.test");
        assert!(sent[0].1.subject.contains("AB12CD34"));
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_raised() {
        let transport = Arc::new(InMemoryTransport::failing());
        let dispatcher =
            NotificationDispatcher::new(transport, "bookings@yatra.test").expect("dispatcher");

        assert!(!dispatcher.send(&record("AB12CD34", 10_000)).await);
        assert_eq!(
            dispatcher.after_commit(&record("AB12CD34", 10_000)).await,
            NotificationOutcome::Failed
        );
    }

    #[tokio::test]
    async fn disabled_hook_skips_without_suffix() {
        let outcome = DisabledNotifications.after_commit(&record("AB12CD34", 10_000)).await;
        assert_eq!(outcome, NotificationOutcome::Skipped);
        assert_eq!(outcome.reply_suffix(), None);
    }
}
