use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::hotels::HotelCatalog;
use crate::domain::booking::BookingId;
use crate::domain::contact::{
    normalize_email, normalize_name, normalize_phone, ContactDetails, CustomerContact,
};
use crate::domain::hotel::Hotel;
use crate::domain::travel::{
    parse_amenities, BudgetTier, TravelMode, TravelPreferences, TravelerCount,
};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    Destination,
    Origin,
    TravelDates,
    Travelers,
    TravelMode,
    Hotel,
    ContactName,
    ContactPhone,
    ContactEmail,
}

impl Slot {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::Origin => "origin",
            Self::TravelDates => "travel dates",
            Self::Travelers => "travelers",
            Self::TravelMode => "travel mode",
            Self::Hotel => "hotel",
            Self::ContactName => "name",
            Self::ContactPhone => "phone",
            Self::ContactEmail => "email",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const TRANSPORT_PREREQUISITES: &[Slot] = &[Slot::Origin, Slot::Destination, Slot::Travelers];
pub const HOTEL_PREREQUISITES: &[Slot] = &[Slot::Destination];
pub const CONFIRMATION_PREREQUISITES: &[Slot] = &[
    Slot::Destination,
    Slot::Origin,
    Slot::Travelers,
    Slot::TravelMode,
    Slot::Hotel,
    Slot::ContactName,
    Slot::ContactPhone,
    Slot::ContactEmail,
];

/// In-progress booking state for a single conversation.
///
/// Nothing here is persisted; a draft that is dropped before confirmation
/// leaves no trace. Setters overwrite without keeping history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    origin: Option<String>,
    destination: Option<String>,
    travel_dates: Option<String>,
    travelers: Option<TravelerCount>,
    preferences: TravelPreferences,
    travel_mode: Option<TravelMode>,
    hotel: Option<Hotel>,
    contact: ContactDetails,
    booking_id: Option<BookingId>,
}

/// The slots every transport quote is priced from.
#[derive(Clone, Copy, Debug)]
pub struct Route<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub travelers: TravelerCount,
}

/// Borrowed view of a draft that passed the confirmation gate.
#[derive(Clone, Debug)]
pub struct ReadyDraft<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub dates: Option<&'a str>,
    pub travelers: TravelerCount,
    pub travel_mode: TravelMode,
    pub hotel: &'a Hotel,
    pub customer: CustomerContact,
}

impl BookingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn travel_dates(&self) -> Option<&str> {
        self.travel_dates.as_deref()
    }

    pub fn travelers(&self) -> Option<TravelerCount> {
        self.travelers
    }

    pub fn preferences(&self) -> &TravelPreferences {
        &self.preferences
    }

    pub fn travel_mode(&self) -> Option<TravelMode> {
        self.travel_mode
    }

    pub fn hotel(&self) -> Option<&Hotel> {
        self.hotel.as_ref()
    }

    pub fn contact(&self) -> &ContactDetails {
        &self.contact
    }

    pub fn booking_id(&self) -> Option<&BookingId> {
        self.booking_id.as_ref()
    }

    /// Stores the catalog's spelling of the destination. Switching to a
    /// different city drops the selected hotel, which belonged to the old one.
    pub fn set_destination(
        &mut self,
        catalog: &HotelCatalog,
        name: &str,
    ) -> Result<&str, DomainError> {
        let entry = catalog.resolve(name).ok_or_else(|| DomainError::UnknownDestination {
            requested: name.trim().to_string(),
            available: catalog.destination_names(),
        })?;

        let changed = self
            .destination
            .as_deref()
            .map(|current| !current.eq_ignore_ascii_case(&entry.name))
            .unwrap_or(false);
        if changed {
            self.hotel = None;
        }

        Ok(self.destination.insert(entry.name.clone()).as_str())
    }

    pub fn set_origin(&mut self, name: &str) -> Result<&str, DomainError> {
        let origin = non_empty("origin", name)?;
        Ok(self.origin.insert(origin).as_str())
    }

    pub fn set_travel_dates(&mut self, text: &str) -> Result<&str, DomainError> {
        let dates = non_empty("travel dates", text)?;
        Ok(self.travel_dates.insert(dates).as_str())
    }

    pub fn set_travelers(
        &mut self,
        adults: u32,
        children: u32,
    ) -> Result<TravelerCount, DomainError> {
        let count = TravelerCount::new(adults, children)?;
        self.travelers = Some(count);
        Ok(count)
    }

    pub fn set_budget(&mut self, tier: &str) -> Result<BudgetTier, DomainError> {
        let tier = tier.parse::<BudgetTier>()?;
        self.preferences.budget = Some(tier);
        Ok(tier)
    }

    pub fn set_amenities(&mut self, raw: &str) -> &[String] {
        self.preferences.amenities = parse_amenities(raw);
        &self.preferences.amenities
    }

    pub fn set_contact_name(&mut self, raw: &str) -> Result<&str, DomainError> {
        let name = normalize_name(raw)?;
        Ok(self.contact.name.insert(name).as_str())
    }

    pub fn set_contact_phone(&mut self, raw: &str) -> Result<&str, DomainError> {
        let phone = normalize_phone(raw)?;
        Ok(self.contact.phone.insert(phone).as_str())
    }

    pub fn set_contact_email(&mut self, raw: &str) -> Result<&str, DomainError> {
        let email = normalize_email(raw)?;
        Ok(self.contact.email.insert(email).as_str())
    }

    pub fn select_transport_mode(&mut self, mode: TravelMode) -> Result<(), DomainError> {
        self.route("transport selection")?;
        self.travel_mode = Some(mode);
        Ok(())
    }

    pub fn select_hotel(
        &mut self,
        catalog: &HotelCatalog,
        hotel_name: &str,
    ) -> Result<&Hotel, DomainError> {
        self.require("hotel selection", HOTEL_PREREQUISITES)?;
        let destination = self.destination.as_deref().unwrap_or_default();
        let hotel = catalog.select(destination, hotel_name)?.clone();
        Ok(&*self.hotel.insert(hotel))
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        match slot {
            Slot::Destination => self.destination.is_some(),
            Slot::Origin => self.origin.is_some(),
            Slot::TravelDates => self.travel_dates.is_some(),
            Slot::Travelers => self.travelers.is_some(),
            Slot::TravelMode => self.travel_mode.is_some(),
            Slot::Hotel => self.hotel.is_some(),
            Slot::ContactName => self.contact.name.is_some(),
            Slot::ContactPhone => self.contact.phone.is_some(),
            Slot::ContactEmail => self.contact.email.is_some(),
        }
    }

    pub fn missing(&self, slots: &[Slot]) -> Vec<Slot> {
        slots.iter().copied().filter(|slot| !self.is_filled(*slot)).collect()
    }

    pub fn require(&self, operation: &str, slots: &[Slot]) -> Result<(), DomainError> {
        let missing = self.missing(slots);
        if missing.is_empty() {
            return Ok(());
        }
        Err(DomainError::MissingPrerequisites {
            operation: operation.to_string(),
            missing: labels(&missing),
        })
    }

    /// Origin, destination and party size, or the error naming whichever
    /// of them `operation` is still missing.
    pub fn route(&self, operation: &str) -> Result<Route<'_>, DomainError> {
        match (self.origin.as_deref(), self.destination.as_deref(), self.travelers) {
            (Some(origin), Some(destination), Some(travelers)) => {
                Ok(Route { origin, destination, travelers })
            }
            _ => Err(DomainError::MissingPrerequisites {
                operation: operation.to_string(),
                missing: labels(&self.missing(TRANSPORT_PREREQUISITES)),
            }),
        }
    }

    pub fn missing_for_confirmation(&self) -> Vec<Slot> {
        self.missing(CONFIRMATION_PREREQUISITES)
    }

    /// The confirmation gate: either every required slot is filled or the
    /// error lists all of the missing ones.
    pub fn ready(&self) -> Result<ReadyDraft<'_>, DomainError> {
        let missing = self.missing_for_confirmation();
        let (
            Some(origin),
            Some(destination),
            Some(travelers),
            Some(travel_mode),
            Some(hotel),
            Some(name),
            Some(phone),
            Some(email),
        ) = (
            self.origin.as_deref(),
            self.destination.as_deref(),
            self.travelers,
            self.travel_mode,
            self.hotel.as_ref(),
            self.contact.name.as_ref(),
            self.contact.phone.as_ref(),
            self.contact.email.as_ref(),
        )
        else {
            return Err(DomainError::IncompleteBooking { missing: labels(&missing) });
        };

        Ok(ReadyDraft {
            origin,
            destination,
            dates: self.travel_dates.as_deref(),
            travelers,
            travel_mode,
            hotel,
            customer: CustomerContact {
                name: name.clone(),
                phone: phone.clone(),
                email: email.clone(),
            },
        })
    }

    pub fn mark_confirmed(&mut self, booking_id: BookingId) {
        self.booking_id = Some(booking_id);
    }
}

fn non_empty(field: &str, raw: &str) -> Result<String, DomainError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::EmptyValue { field: field.to_string() });
    }
    Ok(value.to_string())
}

fn labels(slots: &[Slot]) -> Vec<String> {
    slots.iter().map(|slot| slot.label().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use crate::catalog::hotels::fixtures::goa_catalog;
    use crate::domain::travel::{BudgetTier, TravelMode};
    use crate::errors::DomainError;

    use super::{BookingDraft, Slot};

    #[test]
    fn destination_is_normalized_to_catalog_casing() {
        let catalog = goa_catalog();
        let mut draft = BookingDraft::new();
        assert_eq!(draft.set_destination(&catalog, "  gOA "), Ok("Goa"));
        assert_eq!(draft.destination(), Some("Goa"));
    }

    #[test]
    fn unknown_destination_lists_known_ones() {
        let catalog = goa_catalog();
        let mut draft = BookingDraft::new();
        let error = draft.set_destination(&catalog, "Atlantis").expect_err("unknown city");
        assert!(matches!(
            error,
            DomainError::UnknownDestination { ref available, .. }
                if available.contains(&"Goa".to_string())
        ));
        assert_eq!(draft.destination(), None);
    }

    #[test]
    fn setters_overwrite_previous_values() {
        let mut draft = BookingDraft::new();
        draft.set_origin("Pune").expect("origin");
        draft.set_origin("Mumbai").expect("origin");
        draft.set_budget("high").expect("budget");
        draft.set_budget("low").expect("budget");

        assert_eq!(draft.origin(), Some("Mumbai"));
        assert_eq!(draft.preferences().budget, Some(BudgetTier::Low));
    }

    #[test]
    fn blank_origin_is_rejected() {
        let mut draft = BookingDraft::new();
        assert!(matches!(draft.set_origin("   "), Err(DomainError::EmptyValue { .. })));
    }

    #[test]
    fn transport_selection_lists_every_missing_prerequisite() {
        let mut draft = BookingDraft::new();
        let error = draft.select_transport_mode(TravelMode::Bus).expect_err("nothing filled");
        assert_eq!(
            error,
            DomainError::MissingPrerequisites {
                operation: "transport selection".to_string(),
                missing: vec![
                    "origin".to_string(),
                    "destination".to_string(),
                    "travelers".to_string()
                ],
            }
        );
        assert_eq!(draft.travel_mode(), None);
    }

    #[test]
    fn route_names_only_the_slots_still_missing() {
        let catalog = goa_catalog();
        let mut draft = BookingDraft::new();
        draft.set_destination(&catalog, "Goa").expect("destination");
        draft.set_travelers(2, 0).expect("travelers");
        assert_eq!(
            draft.route("transport quote").expect_err("origin missing"),
            DomainError::MissingPrerequisites {
                operation: "transport quote".to_string(),
                missing: vec!["origin".to_string()],
            }
        );

        draft.set_origin("Mumbai").expect("origin");
        let route = draft.route("transport quote").expect("complete route");
        assert_eq!((route.origin, route.destination), ("Mumbai", "Goa"));
        assert_eq!(route.travelers.total(), 2);
    }

    #[test]
    fn hotel_selection_requires_destination() {
        let catalog = goa_catalog();
        let mut draft = BookingDraft::new();
        assert!(matches!(
            draft.select_hotel(&catalog, "Palm Grove Inn"),
            Err(DomainError::MissingPrerequisites { .. })
        ));
    }

    #[test]
    fn changing_destination_clears_selected_hotel() {
        let catalog = goa_catalog();
        let mut draft = BookingDraft::new();
        draft.set_destination(&catalog, "Goa").expect("destination");
        draft.select_hotel(&catalog, "palm grove inn").expect("hotel");
        assert!(draft.hotel().is_some());

        draft.set_destination(&catalog, "goa").expect("same destination");
        assert!(draft.hotel().is_some(), "same city keeps the hotel");

        draft.set_destination(&catalog, "Jaipur").expect("other destination");
        assert!(draft.hotel().is_none());
    }

    #[test]
    fn ready_reports_all_missing_fields() {
        let catalog = goa_catalog();
        let mut draft = BookingDraft::new();
        draft.set_destination(&catalog, "Goa").expect("destination");
        draft.set_origin("Mumbai").expect("origin");
        draft.set_travelers(2, 0).expect("travelers");
        draft.select_transport_mode(TravelMode::Bus).expect("mode");
        draft.set_contact_name("Asha Rao").expect("name");
        draft.set_contact_phone("9876543210").expect("phone");

        let error = draft.ready().expect_err("hotel and email missing");
        assert_eq!(
            error,
            DomainError::IncompleteBooking {
                missing: vec!["hotel".to_string(), "email".to_string()]
            }
        );
        assert_eq!(draft.missing_for_confirmation(), vec![Slot::Hotel, Slot::ContactEmail]);
    }
}
