use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use yatra_core::domain::booking::{BookingId, BookingRecord, BookingStatus};
use yatra_core::domain::contact::CustomerContact;
use yatra_core::domain::travel::TravelMode;
use yatra_core::store::{BookingStore, BookingUpdate, StoreError};

use super::RepositoryError;
use crate::DbPool;

const BOOKING_COLUMNS: &str = "booking_id, user_name, phone, email, origin, destination,
    travel_mode, hotel_name, dates, num_travelers, travel_cost, hotel_cost, total_cost,
    status, timestamp, hotel_rating, hotel_amenities, hotel_description,
    hotel_price_per_night, cancelled_at";

pub struct SqlBookingStore {
    pool: DbPool,
}

impl SqlBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_booking(row: &sqlx::sqlite::SqliteRow) -> Result<BookingRecord, RepositoryError> {
    let travel_mode: String = decode(row, "travel_mode")?;
    let status: String = decode(row, "status")?;
    let num_travelers: i64 = decode(row, "num_travelers")?;
    let hotel_rating: i64 = decode(row, "hotel_rating")?;
    let amenities_json: String = decode(row, "hotel_amenities")?;
    let timestamp: String = decode(row, "timestamp")?;
    let cancelled_at: Option<String> = decode(row, "cancelled_at")?;

    Ok(BookingRecord {
        booking_id: BookingId(decode(row, "booking_id")?),
        customer: CustomerContact {
            name: decode(row, "user_name")?,
            phone: decode(row, "phone")?,
            email: decode(row, "email")?,
        },
        origin: decode(row, "origin")?,
        destination: decode(row, "destination")?,
        travel_mode: TravelMode::from_str(&travel_mode)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        hotel_name: decode(row, "hotel_name")?,
        hotel_rating: u8::try_from(hotel_rating)
            .map_err(|e| RepositoryError::Decode(format!("hotel_rating: {e}")))?,
        hotel_amenities: serde_json::from_str(&amenities_json)
            .map_err(|e| RepositoryError::Decode(format!("hotel_amenities: {e}")))?,
        hotel_description: decode(row, "hotel_description")?,
        hotel_price_per_night: parse_decimal(
            "hotel_price_per_night",
            &decode::<String>(row, "hotel_price_per_night")?,
        )?,
        dates: decode(row, "dates")?,
        travelers: u32::try_from(num_travelers)
            .map_err(|e| RepositoryError::Decode(format!("num_travelers: {e}")))?,
        travel_cost: parse_decimal("travel_cost", &decode::<String>(row, "travel_cost")?)?,
        hotel_cost: parse_decimal("hotel_cost", &decode::<String>(row, "hotel_cost")?)?,
        total_cost: parse_decimal("total_cost", &decode::<String>(row, "total_cost")?)?,
        status: BookingStatus::from_str(&status)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: parse_timestamp("timestamp", &timestamp)?,
        cancelled_at: cancelled_at
            .as_deref()
            .map(|raw| parse_timestamp("cancelled_at", raw))
            .transpose()?,
    })
}

#[async_trait]
impl BookingStore for SqlBookingStore {
    async fn insert(&self, record: &BookingRecord) -> Result<(), StoreError> {
        let amenities = serde_json::to_string(&record.hotel_amenities)
            .map_err(|e| StoreError::Decode(format!("hotel_amenities: {e}")))?;

        let result = sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(record.booking_id.as_str())
        .bind(&record.customer.name)
        .bind(&record.customer.phone)
        .bind(&record.customer.email)
        .bind(&record.origin)
        .bind(&record.destination)
        .bind(record.travel_mode.as_str())
        .bind(&record.hotel_name)
        .bind(&record.dates)
        .bind(i64::from(record.travelers))
        .bind(record.travel_cost.to_string())
        .bind(record.hotel_cost.to_string())
        .bind(record.total_cost.to_string())
        .bind(record.status.as_str())
        .bind(record.created_at.to_rfc3339())
        .bind(i64::from(record.hotel_rating))
        .bind(amenities)
        .bind(&record.hotel_description)
        .bind(record.hotel_price_per_night.to_string())
        .bind(record.cancelled_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateKey(record.booking_id.clone()))
            }
            Err(error) => Err(RepositoryError::from(error).into()),
        }
    }

    async fn find_one(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = ?");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        match row {
            Some(ref r) => Ok(Some(row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn update_one(&self, id: &BookingId, update: BookingUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, cancelled_at = ? WHERE booking_id = ? AND status = ?",
        )
        .bind(update.status.as_str())
        .bind(update.cancelled_at.map(|dt| dt.to_rfc3339()))
        .bind(id.as_str())
        .bind(update.expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<BookingRecord>, StoreError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             ORDER BY timestamp DESC, booking_id ASC
             LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.iter()
            .map(|row| row_to_booking(row).map_err(StoreError::from))
            .collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use yatra_core::domain::booking::{BookingId, BookingRecord, BookingStatus};
    use yatra_core::domain::contact::CustomerContact;
    use yatra_core::domain::travel::TravelMode;
    use yatra_core::store::{BookingStore, BookingUpdate, StoreError};

    use super::SqlBookingStore;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlBookingStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlBookingStore::new(pool)
    }

    fn sample_booking(id: &str) -> BookingRecord {
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
            hotel_name: "Sea Breeze Resort".to_string(),
            hotel_rating: 4,
            hotel_amenities: vec!["pool".to_string(), "wifi".to_string()],
            hotel_description: "Beachfront rooms".to_string(),
            hotel_price_per_night: Decimal::from(6500),
            dates: Some("12-15 December".to_string()),
            travelers: 2,
            travel_cost: Decimal::from(2320),
            hotel_cost: Decimal::from(39000),
            total_cost: Decimal::from(41320),
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let store = setup().await;
        let booking = sample_booking("AB12CD34");
        store.insert(&booking).await.expect("insert");

        let found = store
            .find_one(&BookingId::normalize("AB12CD34"))
            .await
            .expect("find")
            .expect("should exist");

        assert_eq!(found.booking_id, booking.booking_id);
        assert_eq!(found.customer, booking.customer);
        assert_eq!(found.travel_mode, TravelMode::Bus);
        assert_eq!(found.hotel_amenities, booking.hotel_amenities);
        assert_eq!(found.total_cost, Decimal::from(41320));
        assert_eq!(found.created_at.timestamp(), booking.created_at.timestamp());
        assert_eq!(found.dates.as_deref(), Some("12-15 December"));
    }

    #[tokio::test]
    async fn fractional_costs_survive_storage() {
        let store = setup().await;
        let mut booking = sample_booking("FRAC0001");
        booking.travel_cost = Decimal::from_str("870.50").expect("decimal");
        store.insert(&booking).await.expect("insert");

        let found = store.find_one(&booking.booking_id).await.expect("find").expect("exists");
        assert_eq!(found.travel_cost, Decimal::from_str("870.5").expect("decimal"));
    }

    #[tokio::test]
    async fn duplicate_booking_id_is_reported_as_duplicate_key() {
        let store = setup().await;
        store.insert(&sample_booking("AB12CD34")).await.expect("first insert");

        let error = store.insert(&sample_booking("AB12CD34")).await.expect_err("duplicate");
        assert!(matches!(error, StoreError::DuplicateKey(ref id) if id.as_str() == "AB12CD34"));
    }

    #[tokio::test]
    async fn update_one_sets_status_and_cancellation_time() {
        let store = setup().await;
        store.insert(&sample_booking("AB12CD34")).await.expect("insert");

        let now = Utc::now();
        let matched = store
            .update_one(&BookingId::normalize("AB12CD34"), BookingUpdate::cancelled(now))
            .await
            .expect("update");
        assert!(matched);

        let found = store
            .find_one(&BookingId::normalize("AB12CD34"))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(found.status, BookingStatus::Cancelled);
        assert_eq!(found.cancelled_at.map(|dt| dt.timestamp()), Some(now.timestamp()));

        let repeated = store
            .update_one(&BookingId::normalize("AB12CD34"), BookingUpdate::cancelled(Utc::now()))
            .await
            .expect("update");
        assert!(!repeated);

        let missing = store
            .update_one(&BookingId::normalize("ZZZZ9999"), BookingUpdate::cancelled(now))
            .await
            .expect("update");
        assert!(!missing);
    }

    #[tokio::test]
    async fn list_recent_orders_newest_first() {
        let store = setup().await;
        let mut older = sample_booking("OLDER001");
        older.created_at = Utc::now() - Duration::days(1);
        store.insert(&older).await.expect("insert older");
        store.insert(&sample_booking("NEWER001")).await.expect("insert newer");

        let recent = store.list_recent(10).await.expect("list");
        let ids: Vec<&str> = recent.iter().map(|booking| booking.booking_id.as_str()).collect();
        assert_eq!(ids, vec!["NEWER001", "OLDER001"]);

        assert_eq!(store.list_recent(1).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn missing_booking_is_none() {
        let store = setup().await;
        let found = store.find_one(&BookingId::normalize("NOPE0000")).await.expect("find");
        assert!(found.is_none());
    }
}
