use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::hotel::Hotel;
use crate::domain::travel::{BudgetTier, TravelPreferences};
use crate::errors::DomainError;

pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationEntry {
    pub name: String,
    #[serde(default)]
    pub hotels: Vec<Hotel>,
}

/// Nightly price thresholds for the `low` and `high` budget tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub low_budget_ceiling: Decimal,
    pub high_budget_floor: Decimal,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self { low_budget_ceiling: Decimal::from(5000), high_budget_floor: Decimal::from(15000) }
    }
}

impl EligibilityPolicy {
    fn admits(&self, hotel: &Hotel, preferences: &TravelPreferences) -> bool {
        if !hotel.available {
            return false;
        }
        let within_budget = match preferences.budget {
            Some(BudgetTier::Low) => hotel.price_per_night <= self.low_budget_ceiling,
            Some(BudgetTier::High) => hotel.price_per_night >= self.high_budget_floor,
            Some(BudgetTier::Medium) | None => true,
        };
        within_budget && hotel.offers_all(&preferences.amenities)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionOrigin {
    Filtered,
    /// Nothing matched the preferences; these are the first catalog entries as listed.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HotelSuggestions {
    pub destination: String,
    pub hotels: Vec<Hotel>,
    pub origin: SuggestionOrigin,
}

#[derive(Clone, Debug, Default)]
pub struct HotelCatalog {
    destinations: Vec<DestinationEntry>,
    policy: EligibilityPolicy,
}

impl HotelCatalog {
    pub fn new(destinations: Vec<DestinationEntry>) -> Self {
        Self { destinations, policy: EligibilityPolicy::default() }
    }

    pub fn with_policy(mut self, policy: EligibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    pub fn destinations(&self) -> &[DestinationEntry] {
        &self.destinations
    }

    pub fn destination_names(&self) -> Vec<String> {
        self.destinations.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn resolve(&self, name: &str) -> Option<&DestinationEntry> {
        let name = name.trim();
        self.destinations.iter().find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn hotels(&self, destination: &str) -> Result<&[Hotel], DomainError> {
        self.resolve(destination)
            .map(|entry| entry.hotels.as_slice())
            .ok_or_else(|| no_catalog_entry(destination))
    }

    pub fn suggest(
        &self,
        destination: &str,
        preferences: &TravelPreferences,
    ) -> Result<HotelSuggestions, DomainError> {
        let entry = self
            .resolve(destination)
            .ok_or_else(|| no_catalog_entry(destination))?;

        let filtered: Vec<Hotel> = entry
            .hotels
            .iter()
            .filter(|hotel| self.policy.admits(hotel, preferences))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect();

        if !filtered.is_empty() {
            return Ok(HotelSuggestions {
                destination: entry.name.clone(),
                hotels: filtered,
                origin: SuggestionOrigin::Filtered,
            });
        }

        tracing::debug!(
            event_name = "catalog.suggestion_fallback",
            destination = %entry.name,
            budget = ?preferences.budget,
            amenities = ?preferences.amenities,
            "no hotel matched preferences; falling back to catalog order"
        );

        Ok(HotelSuggestions {
            destination: entry.name.clone(),
            hotels: entry.hotels.iter().take(MAX_SUGGESTIONS).cloned().collect(),
            origin: SuggestionOrigin::Fallback,
        })
    }

    pub fn select(&self, destination: &str, hotel_name: &str) -> Result<&Hotel, DomainError> {
        let hotels = self.hotels(destination)?;
        hotels.iter().find(|hotel| hotel.matches_name(hotel_name)).ok_or_else(|| {
            DomainError::HotelNotFound {
                destination: destination.trim().to_string(),
                requested: hotel_name.trim().to_string(),
                available: hotels.iter().map(|hotel| hotel.name.clone()).collect(),
            }
        })
    }
}

fn no_catalog_entry(destination: &str) -> DomainError {
    DomainError::NoCatalogEntry { destination: destination.trim().to_string() }
}
