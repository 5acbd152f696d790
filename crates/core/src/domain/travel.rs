use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Flight,
    Train,
    Bus,
    Car,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] =
        [TravelMode::Flight, TravelMode::Train, TravelMode::Bus, TravelMode::Car];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Train => "train",
            Self::Bus => "bus",
            Self::Car => "car",
        }
    }

    pub fn expected_values() -> String {
        Self::ALL.iter().map(TravelMode::as_str).collect::<Vec<_>>().join("|")
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flight" | "plane" | "air" => Ok(Self::Flight),
            "train" | "rail" => Ok(Self::Train),
            "bus" | "coach" => Ok(Self::Bus),
            "car" | "cab" | "taxi" => Ok(Self::Car),
            _ => Err(DomainError::UnknownMode {
                requested: value.trim().to_string(),
                expected: Self::expected_values(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(DomainError::InvalidEnum {
                field: "budget".to_string(),
                value: value.trim().to_string(),
                expected: "low|medium|high".to_string(),
            }),
        }
    }
}

/// Budget and amenity preferences collected during the conversation.
///
/// An unset budget applies no price filter, the same as `medium`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelPreferences {
    pub budget: Option<BudgetTier>,
    pub amenities: Vec<String>,
}

/// Splits a free-text amenity preference into normalized amenity names.
///
/// `"none"` and blank input both mean "no amenity requirement".
pub fn parse_amenities(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let mut amenities: Vec<String> = Vec::new();
    for part in trimmed.split(',') {
        let amenity = part.trim().to_lowercase();
        if amenity.is_empty() || amenity == "none" {
            continue;
        }
        if !amenities.contains(&amenity) {
            amenities.push(amenity);
        }
    }
    amenities
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelerCount {
    pub adults: u32,
    pub children: u32,
}

impl TravelerCount {
    pub fn new(adults: u32, children: u32) -> Result<Self, DomainError> {
        if adults.saturating_add(children) == 0 {
            return Err(DomainError::InvalidTravelerCount { adults, children });
        }
        Ok(Self { adults, children })
    }

    pub fn total(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}
