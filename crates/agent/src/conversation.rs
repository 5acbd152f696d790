//! Natural-language replies returned to the dialogue orchestrator.
//!
//! Every reply is derived from the draft or record it describes. Nothing here
//! remembers which question was asked last; the next prompt is always computed
//! from the slots that are still empty.

use rust_decimal::Decimal;
use yatra_core::catalog::hotels::{HotelSuggestions, SuggestionOrigin};
use yatra_core::domain::booking::BookingRecord;
use yatra_core::domain::draft::{BookingDraft, Slot};
use yatra_core::errors::DomainError;
use yatra_core::lifecycle::{CancellationOutcome, Confirmation};
use yatra_core::pricing::TransportQuote;
use yatra_core::DistanceSource;

/// Order in which an assistant would normally ask for slots.
pub const PROMPT_ORDER: [Slot; 9] = [
    Slot::Destination,
    Slot::Origin,
    Slot::TravelDates,
    Slot::Travelers,
    Slot::TravelMode,
    Slot::Hotel,
    Slot::ContactName,
    Slot::ContactPhone,
    Slot::ContactEmail,
];

pub const RETRY_LATER: &str =
    "I couldn't reach the booking system just now. Please try again in a moment.";

pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

pub fn question_for(slot: Slot) -> &'static str {
    match slot {
        Slot::Destination => "Where would you like to go?",
        Slot::Origin => "Which city will you be travelling from?",
        Slot::TravelDates => "What dates are you planning to travel?",
        Slot::Travelers => "How many adults and children are travelling?",
        Slot::TravelMode => "Would you like to go by flight, train, bus or car?",
        Slot::Hotel => "Which hotel would you like? I can suggest a few.",
        Slot::ContactName => "What name should the booking be under?",
        Slot::ContactPhone => "What phone number can we reach you on?",
        Slot::ContactEmail => "Which email address should the confirmation go to?",
    }
}

/// The question for the first empty slot, or the invitation to confirm.
pub fn next_prompt(draft: &BookingDraft) -> &'static str {
    if draft.booking_id().is_some() {
        return "This booking is already confirmed.";
    }
    PROMPT_ORDER
        .iter()
        .find(|slot| !draft.is_filled(**slot))
        .map(|slot| question_for(*slot))
        .unwrap_or("Everything is in place. Shall I confirm the booking?")
}

pub fn with_next_prompt(reply: impl Into<String>, draft: &BookingDraft) -> String {
    format!("{} {}", reply.into(), next_prompt(draft))
}

/// Turns a recoverable domain error into a reply that tells the user what to fix.
pub fn corrective_prompt(error: &DomainError) -> String {
    match error {
        DomainError::UnknownDestination { requested, available } => format!(
            "Sorry, we don't offer trips to {requested} yet. Available destinations are: {}.",
            available.join(", ")
        ),
        DomainError::InvalidEnum { field, value, expected } => format!(
            "'{value}' isn't a valid {field}. Please choose one of: {}.",
            expected.replace('|', ", ")
        ),
        DomainError::UnknownMode { requested, expected } => format!(
            "'{requested}' isn't a travel mode we book. Please choose one of: {}.",
            expected.replace('|', ", ")
        ),
        DomainError::EmptyValue { field } => {
            format!("I didn't catch the {field}. Could you repeat it?")
        }
        DomainError::InvalidTravelerCount { .. } => {
            "At least one traveler is needed. How many adults and children are travelling?"
                .to_string()
        }
        DomainError::InvalidContact { field, reason } => {
            format!("That {field} doesn't look right: {reason}. Could you give it again?")
        }
        DomainError::NoCatalogEntry { destination } => {
            format!("I don't have any hotels listed for {destination}.")
        }
        DomainError::HotelNotFound { destination, requested, available } => format!(
            "I couldn't find '{requested}' in {destination}. The hotels there are: {}.",
            available.join(", ")
        ),
        DomainError::MissingPrerequisites { operation, missing } => {
            format!("Before the {operation} I still need: {}.", missing.join(", "))
        }
        DomainError::IncompleteBooking { missing } => {
            format!("I can't confirm yet. I still need: {}.", missing.join(", "))
        }
        DomainError::AlreadyConfirmed { booking_id } => format!(
            "This conversation already confirmed booking {booking_id}. \
             Start a new conversation for another trip."
        ),
        DomainError::BookingNotFound { booking_id } => format!(
            "I couldn't find a booking with ID {booking_id}. Please check the ID and try again."
        ),
        DomainError::InvalidBookingTransition { from, .. } => {
            format!("That booking is {from} and can't be changed that way.")
        }
    }
}

pub fn describe_quote(quote: &TransportQuote) -> String {
    let estimate = match quote.distance_source {
        DistanceSource::Table => "",
        DistanceSource::Default => " (estimated distance)",
    };
    format!(
        "By {}: {} km{estimate}, about {} hours, costing {} for {} traveler(s). {}",
        quote.mode,
        quote.distance_km,
        quote.duration_hours,
        format_amount(quote.cost),
        quote.travelers,
        quote.description
    )
    .trim_end()
    .to_string()
}

pub fn describe_suggestions(suggestions: &HotelSuggestions) -> String {
    let lead = match suggestions.origin {
        SuggestionOrigin::Filtered => {
            format!("Here are hotels in {} that match your preferences:", suggestions.destination)
        }
        SuggestionOrigin::Fallback => format!(
            "Nothing in {} matched your preferences exactly, so here are our first listings there:",
            suggestions.destination
        ),
    };

    let lines = suggestions
        .hotels
        .iter()
        .enumerate()
        .map(|(index, hotel)| {
            let amenities = if hotel.amenities.is_empty() {
                String::new()
            } else {
                format!(", {}", hotel.amenities.join(", "))
            };
            format!(
                "{}. {} ({} stars, {} per night{amenities})",
                index + 1,
                hotel.name,
                hotel.rating,
                format_amount(hotel.price_per_night)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!("{lead} {lines}")
}

pub fn describe_confirmation(confirmation: &Confirmation) -> String {
    let record = &confirmation.record;
    let mut reply = format!(
        "Your booking is confirmed. Booking ID: {}. {} to {} by {}, staying at {}. \
         Travel {} + hotel {} = total {}.",
        record.booking_id,
        record.origin,
        record.destination,
        record.travel_mode,
        record.hotel_name,
        format_amount(record.travel_cost),
        format_amount(record.hotel_cost),
        format_amount(record.total_cost)
    );
    if let Some(suffix) = confirmation.notification.reply_suffix() {
        reply.push(' ');
        reply.push_str(suffix);
    }
    reply
}

pub fn describe_booking(record: &BookingRecord) -> String {
    format!(
        "Booking {} for {} is {}: {} to {} by {} on {}, {} traveler(s), staying at {}. Total {}.",
        record.booking_id,
        record.customer.name,
        record.status,
        record.origin,
        record.destination,
        record.travel_mode,
        record.dates.as_deref().unwrap_or("dates to be confirmed"),
        record.travelers,
        record.hotel_name,
        format_amount(record.total_cost)
    )
}

pub fn describe_cancellation(outcome: &CancellationOutcome) -> String {
    match outcome {
        CancellationOutcome::Cancelled { record, refund } => format!(
            "Booking {} has been cancelled. A refund of {} will be processed.",
            record.booking_id,
            format_amount(*refund)
        ),
        CancellationOutcome::AlreadyCancelled { record } => {
            format!("Booking {} is already cancelled.", record.booking_id)
        }
    }
}

/// One-line summary of what is filled and what is still missing.
pub fn status_summary(draft: &BookingDraft) -> String {
    let mut filled = Vec::new();
    if let Some(destination) = draft.destination() {
        filled.push(format!("destination {destination}"));
    }
    if let Some(origin) = draft.origin() {
        filled.push(format!("from {origin}"));
    }
    if let Some(dates) = draft.travel_dates() {
        filled.push(format!("dates {dates}"));
    }
    if let Some(travelers) = draft.travelers() {
        filled.push(format!(
            "{} adult(s) and {} child(ren)",
            travelers.adults, travelers.children
        ));
    }
    if let Some(budget) = draft.preferences().budget {
        filled.push(format!("{budget} budget"));
    }
    if !draft.preferences().amenities.is_empty() {
        filled.push(format!("amenities {}", draft.preferences().amenities.join(", ")));
    }
    if let Some(mode) = draft.travel_mode() {
        filled.push(format!("by {mode}"));
    }
    if let Some(hotel) = draft.hotel() {
        filled.push(format!("hotel {}", hotel.name));
    }
    if let Some(name) = draft.contact().name.as_deref() {
        filled.push(format!("name {name}"));
    }
    if let Some(phone) = draft.contact().phone.as_deref() {
        filled.push(format!("phone {phone}"));
    }
    if let Some(email) = draft.contact().email.as_deref() {
        filled.push(format!("email {email}"));
    }

    let have = if filled.is_empty() {
        "Nothing has been collected yet.".to_string()
    } else {
        format!("So far: {}.", filled.join("; "))
    };

    if let Some(booking_id) = draft.booking_id() {
        return format!("{have} Confirmed as booking {booking_id}.");
    }

    let missing = draft.missing_for_confirmation();
    if missing.is_empty() {
        format!("{have} Ready to confirm.")
    } else {
        let labels = missing.iter().map(Slot::label).collect::<Vec<_>>().join(", ");
        format!("{have} Still needed: {labels}.")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use yatra_core::catalog::ReferenceCatalog;
    use yatra_core::domain::draft::BookingDraft;
    use yatra_core::errors::DomainError;

    use super::{corrective_prompt, format_amount, next_prompt, status_summary};

    #[test]
    fn next_prompt_follows_the_first_empty_slot() {
        let catalog = ReferenceCatalog::embedded().expect("catalog");
        let mut draft = BookingDraft::new();
        assert_eq!(next_prompt(&draft), "Where would you like to go?");

        draft.set_destination(&catalog.hotels, "goa").expect("destination");
        assert_eq!(next_prompt(&draft), "Which city will you be travelling from?");

        draft.set_origin("Mumbai").expect("origin");
        draft.set_travelers(2, 0).expect("travelers");
        assert_eq!(next_prompt(&draft), "What dates are you planning to travel?");
    }

    #[test]
    fn incomplete_booking_prompt_lists_every_missing_field() {
        let reply = corrective_prompt(&DomainError::IncompleteBooking {
            missing: vec!["hotel".to_string(), "email".to_string()],
        });
        assert!(reply.contains("hotel, email"));
    }

    #[test]
    fn enum_prompt_lists_choices_readably() {
        let reply = corrective_prompt(&DomainError::InvalidEnum {
            field: "budget".to_string(),
            value: "cheap".to_string(),
            expected: "low|medium|high".to_string(),
        });
        assert_eq!(reply, "'cheap' isn't a valid budget. Please choose one of: low, medium, high.");
    }

    #[test]
    fn amounts_always_show_two_decimals() {
        assert_eq!(format_amount(Decimal::from(8000)), "8000.00");
        assert_eq!(format_amount(Decimal::new(87055, 2)), "870.55");
    }

    #[test]
    fn status_summary_reports_filled_and_missing() {
        let catalog = ReferenceCatalog::embedded().expect("catalog");
        let mut draft = BookingDraft::new();
        draft.set_destination(&catalog.hotels, "Goa").expect("destination");
        draft.set_contact_email("asha@example.com").expect("email");

        let summary = status_summary(&draft);
        assert!(summary.contains("destination Goa"));
        assert!(summary.contains("email asha@example.com"));
        assert!(
            summary.contains("Still needed: origin, travelers, travel mode, hotel, name, phone.")
        );
    }
}
