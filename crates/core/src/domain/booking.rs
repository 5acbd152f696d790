use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::contact::CustomerContact;
use crate::domain::travel::TravelMode;
use crate::errors::DomainError;

/// Booking identifiers are always stored and compared in uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl BookingId {
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::InvalidEnum {
                field: "status".to_string(),
                value: other.to_string(),
                expected: "confirmed|cancelled".to_string(),
            }),
        }
    }
}

/// A committed booking. Only `status` and `cancelled_at` change after insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: BookingId,
    pub customer: CustomerContact,
    pub origin: String,
    pub destination: String,
    pub travel_mode: TravelMode,
    pub hotel_name: String,
    pub hotel_rating: u8,
    pub hotel_amenities: Vec<String>,
    pub hotel_description: String,
    pub hotel_price_per_night: Decimal,
    pub dates: Option<String>,
    pub travelers: u32,
    pub travel_cost: Decimal,
    pub hotel_cost: Decimal,
    pub total_cost: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl BookingRecord {
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!((self.status, next), (BookingStatus::Confirmed, BookingStatus::Cancelled))
    }

    pub fn transition_to(&mut self, next: BookingStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidBookingTransition { from: self.status, to: next })
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{BookingId, BookingRecord, BookingStatus};
    use crate::domain::contact::CustomerContact;
    use crate::domain::travel::TravelMode;

    pub(crate) fn record(id: &str, total: i64) -> BookingRecord {
        BookingRecord {
            booking_id: BookingId::normalize(id),
            customer: CustomerContact {
                name: "Asha Rao".to_string(),
                phone: "+919876543210".to_string(),
                email: "asha@example.com".to_string(),
            },
            origin: "Mumbai".to_string(),
            destination: "Goa".to_string(),
            travel_mode: TravelMode::Bus,
            hotel_name: "Palm Grove Inn".to_string(),
            hotel_rating: 3,
            hotel_amenities: vec!["wifi".to_string()],
            hotel_description: "Quiet rooms near Calangute".to_string(),
            hotel_price_per_night: Decimal::from(2500),
            dates: Some("12-15 December".to_string()),
            travelers: 2,
            travel_cost: Decimal::ZERO,
            hotel_cost: Decimal::from(total),
            total_cost: Decimal::from(total),
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }
}
