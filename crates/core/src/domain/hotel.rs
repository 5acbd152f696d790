use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub name: String,
    pub price_per_night: Decimal,
    pub rating: u8,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub description: String,
}

fn default_available() -> bool {
    true
}

impl Hotel {
    /// True when every requested amenity is offered. Comparison ignores case.
    pub fn offers_all(&self, requested: &[String]) -> bool {
        requested.iter().all(|wanted| {
            self.amenities.iter().any(|offered| offered.trim().eq_ignore_ascii_case(wanted.trim()))
        })
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::Hotel;

    fn hotel() -> Hotel {
        Hotel {
            name: "Sea Breeze Resort".to_string(),
            price_per_night: Decimal::from(6500),
            rating: 4,
            amenities: vec!["Pool".to_string(), "WiFi".to_string(), "Beach Access".to_string()],
            available: true,
            description: "Beachfront rooms".to_string(),
        }
    }

    #[test]
    fn amenity_superset_check_ignores_case() {
        let hotel = hotel();
        assert!(hotel.offers_all(&["pool".to_string(), "wifi".to_string()]));
        assert!(hotel.offers_all(&[]));
        assert!(!hotel.offers_all(&["pool".to_string(), "spa".to_string()]));
    }

    #[test]
    fn name_match_is_exact_but_case_insensitive() {
        let hotel = hotel();
        assert!(hotel.matches_name("sea breeze resort"));
        assert!(!hotel.matches_name("sea breeze"));
    }
}
