use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::travel::TravelMode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFare {
    pub mode: TravelMode,
    pub cost_per_km: Decimal,
    pub speed_kmh: Decimal,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDistance {
    pub from: String,
    pub to: String,
    pub km: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    Table,
    Default,
}

/// Undirected city-pair distances plus per-mode fare coefficients.
#[derive(Clone, Debug)]
pub struct FareTable {
    default_distance_km: u32,
    distances: HashMap<(String, String), u32>,
    fares: BTreeMap<TravelMode, ModeFare>,
}

impl FareTable {
    pub fn new(
        default_distance_km: u32,
        routes: impl IntoIterator<Item = RouteDistance>,
        fares: impl IntoIterator<Item = ModeFare>,
    ) -> Self {
        let distances = routes
            .into_iter()
            .map(|route| (route_key(&route.from, &route.to), route.km))
            .collect();
        let fares = fares.into_iter().map(|fare| (fare.mode, fare)).collect();
        Self { default_distance_km, distances, fares }
    }

    pub fn default_distance_km(&self) -> u32 {
        self.default_distance_km
    }

    /// Looks the pair up in either direction, falling back to the default.
    pub fn distance(&self, origin: &str, destination: &str) -> (u32, DistanceSource) {
        match self.distances.get(&route_key(origin, destination)) {
            Some(km) => (*km, DistanceSource::Table),
            None => (self.default_distance_km, DistanceSource::Default),
        }
    }

    pub fn fare(&self, mode: TravelMode) -> Option<&ModeFare> {
        self.fares.get(&mode)
    }

    pub fn fares(&self) -> impl Iterator<Item = &ModeFare> {
        self.fares.values()
    }

    pub fn route_count(&self) -> usize {
        self.distances.len()
    }
}

fn route_key(a: &str, b: &str) -> (String, String) {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{DistanceSource, FareTable, ModeFare, RouteDistance};
    use crate::domain::travel::TravelMode;

    fn table() -> FareTable {
        FareTable::new(
            500,
            vec![RouteDistance { from: "Mumbai".to_string(), to: "Goa".to_string(), km: 580 }],
            vec![ModeFare {
                mode: TravelMode::Bus,
                cost_per_km: Decimal::from(2),
                speed_kmh: Decimal::from(50),
                description: "coach".to_string(),
            }],
        )
    }

    #[test]
    fn lookup_is_symmetric_and_case_insensitive() {
        let table = table();
        assert_eq!(table.distance("Mumbai", "Goa"), (580, DistanceSource::Table));
        assert_eq!(table.distance(" goa", "MUMBAI "), (580, DistanceSource::Table));
    }

    #[test]
    fn unknown_pair_uses_default_distance() {
        assert_eq!(table().distance("Pune", "Goa"), (500, DistanceSource::Default));
    }

    #[test]
    fn missing_mode_has_no_fare() {
        let table = table();
        assert!(table.fare(TravelMode::Bus).is_some());
        assert!(table.fare(TravelMode::Flight).is_none());
    }
}
