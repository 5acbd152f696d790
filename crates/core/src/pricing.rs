use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::fares::{DistanceSource, FareTable};
use crate::catalog::ReferenceCatalog;
use crate::domain::travel::TravelMode;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportQuote {
    pub mode: TravelMode,
    pub distance_km: u32,
    pub travelers: u32,
    pub cost: Decimal,
    pub duration_hours: Decimal,
    pub description: String,
    pub distance_source: DistanceSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripTotals {
    pub travel_cost: Decimal,
    pub hotel_cost: Decimal,
    pub total_cost: Decimal,
}

pub trait PricingEngine: Send + Sync {
    fn quote_transport(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
        travelers: u32,
    ) -> Result<TransportQuote, DomainError>;

    /// Quotes every mode the fare table knows, in `TravelMode::ALL` order.
    fn compare_modes(
        &self,
        origin: &str,
        destination: &str,
        travelers: u32,
    ) -> Vec<TransportQuote> {
        TravelMode::ALL
            .iter()
            .filter_map(|mode| self.quote_transport(origin, destination, *mode, travelers).ok())
            .collect()
    }
}

pub struct CatalogPricingEngine {
    catalog: Arc<ReferenceCatalog>,
}

impl CatalogPricingEngine {
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        Self { catalog }
    }
}

impl PricingEngine for CatalogPricingEngine {
    fn quote_transport(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
        travelers: u32,
    ) -> Result<TransportQuote, DomainError> {
        quote_transport(&self.catalog.fares, origin, destination, mode, travelers)
    }
}

/// cost = distance x rate x travelers, duration = distance / speed (2 dp).
pub fn quote_transport(
    table: &FareTable,
    origin: &str,
    destination: &str,
    mode: TravelMode,
    travelers: u32,
) -> Result<TransportQuote, DomainError> {
    let fare = table.fare(mode).ok_or_else(|| DomainError::UnknownMode {
        requested: mode.to_string(),
        expected: table.fares().map(|fare| fare.mode.as_str()).collect::<Vec<_>>().join("|"),
    })?;
    let (distance_km, distance_source) = table.distance(origin, destination);
    let distance = Decimal::from(distance_km);

    let cost = distance * fare.cost_per_km * Decimal::from(travelers);
    let duration_hours = if fare.speed_kmh.is_zero() {
        Decimal::ZERO
    } else {
        (distance / fare.speed_kmh).round_dp(2).normalize()
    };

    Ok(TransportQuote {
        mode,
        distance_km,
        travelers,
        cost,
        duration_hours,
        description: fare.description.clone(),
        distance_source,
    })
}

pub fn stay_cost(price_per_night: Decimal, nights: u32, travelers: u32) -> Decimal {
    price_per_night * Decimal::from(nights) * Decimal::from(travelers)
}

pub fn trip_totals(transport: &TransportQuote, hotel_cost: Decimal) -> TripTotals {
    TripTotals {
        travel_cost: transport.cost,
        hotel_cost,
        total_cost: transport.cost + hotel_cost,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{stay_cost, trip_totals, CatalogPricingEngine, PricingEngine};
    use crate::catalog::fares::DistanceSource;
    use crate::catalog::ReferenceCatalog;
    use crate::domain::travel::TravelMode;

    fn engine() -> CatalogPricingEngine {
        CatalogPricingEngine::new(Arc::new(ReferenceCatalog::embedded().expect("catalog")))
    }

    #[test]
    fn mumbai_to_goa_by_bus_for_two() {
        let quote = engine()
            .quote_transport("Mumbai", "Goa", TravelMode::Bus, 2)
            .expect("bus fare exists");

        assert_eq!(quote.distance_km, 580);
        assert_eq!(quote.cost, Decimal::from(2320));
        assert_eq!(quote.duration_hours, Decimal::from_str("11.6").expect("decimal"));
        assert_eq!(quote.duration_hours.to_string(), "11.6");
        assert_eq!(quote.distance_source, DistanceSource::Table);
    }

    #[test]
    fn quote_is_symmetric() {
        let engine = engine();
        let there = engine.quote_transport("Mumbai", "Goa", TravelMode::Train, 3).expect("train");
        let back = engine.quote_transport("Goa", "Mumbai", TravelMode::Train, 3).expect("train");
        assert_eq!(there, back);
        assert_eq!(there.cost, Decimal::from(2610));
    }

    #[test]
    fn unknown_pair_uses_default_distance() {
        let quote =
            engine().quote_transport("Pune", "Goa", TravelMode::Flight, 1).expect("flight fare");
        assert_eq!(quote.distance_km, 500);
        assert_eq!(quote.distance_source, DistanceSource::Default);
        assert_eq!(quote.cost, Decimal::from(4000));
        assert_eq!(quote.duration_hours, Decimal::from_str("0.83").expect("decimal"));
    }

    #[test]
    fn compare_modes_covers_every_mode() {
        let quotes = engine().compare_modes("Mumbai", "Goa", 1);
        let modes: Vec<TravelMode> = quotes.iter().map(|quote| quote.mode).collect();
        assert_eq!(modes, TravelMode::ALL.to_vec());
    }

    #[test]
    fn stay_cost_scales_with_nights_and_travelers() {
        assert_eq!(stay_cost(Decimal::from(6500), 3, 2), Decimal::from(39000));
        let quote =
            engine().quote_transport("Mumbai", "Goa", TravelMode::Bus, 2).expect("bus fare");
        let totals = trip_totals(&quote, Decimal::from(39000));
        assert_eq!(totals.total_cost, Decimal::from(41320));
    }
}
