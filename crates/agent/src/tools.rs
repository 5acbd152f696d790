use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use yatra_core::catalog::ReferenceCatalog;
use yatra_core::domain::draft::{BookingDraft, HOTEL_PREREQUISITES};
use yatra_core::domain::travel::TravelMode;
use yatra_core::errors::{ApplicationError, DomainError};
use yatra_core::lifecycle::BookingLifecycle;

use crate::conversation::{
    corrective_prompt, describe_booking, describe_cancellation, describe_confirmation,
    describe_quote, describe_suggestions, status_summary, with_next_prompt, RETRY_LATER,
};

/// Shared, read-only collaborators every tool may use.
pub struct BookingServices {
    pub catalog: Arc<ReferenceCatalog>,
    pub lifecycle: Arc<BookingLifecycle>,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Application(ApplicationError),
}

impl From<ApplicationError> for ToolError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(domain) => Self::Domain(domain),
            other => Self::Application(other),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError>;
}

fn parse_args<T: DeserializeOwned>(tool: &'static str, input: Value) -> Result<T, ToolError> {
    let input = if input.is_null() { Value::Object(Default::default()) } else { input };
    serde_json::from_value(input)
        .map_err(|error| ToolError::InvalidArguments { tool, reason: error.to_string() })
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Every booking tool the orchestrator may call.
    pub fn booking() -> Self {
        let mut registry = Self::default();
        registry.register(SetDestination);
        registry.register(SetOrigin);
        registry.register(SetTravelDates);
        registry.register(SetTravelers);
        registry.register(SetBudget);
        registry.register(SetAmenities);
        registry.register(QuoteTransport);
        registry.register(SelectTransportMode);
        registry.register(SuggestHotels);
        registry.register(SelectHotel);
        registry.register(SetContactDetails);
        registry.register(ConfirmBooking);
        registry.register(RetrieveBooking);
        registry.register(CancelBooking);
        registry.register(BookingStatus);
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn describe(&self) -> Vec<(&str, &'static str)> {
        self.tools.iter().map(|(name, tool)| (name.as_str(), tool.description())).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs one tool. Recoverable failures come back as corrective replies;
    /// only unknown tools and fatal application errors are `Err`.
    pub async fn invoke(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        name: &str,
        input: Value,
    ) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("unknown tool `{name}`"))?;

        match tool.execute(services, draft, input).await {
            Ok(reply) => Ok(reply),
            Err(ToolError::InvalidArguments { tool, reason }) => {
                tracing::debug!(event_name = "tool.invalid_arguments", tool, reason = %reason);
                Ok(format!(
                    "I couldn't understand the details for {tool} ({reason}). Could you rephrase?"
                ))
            }
            Err(ToolError::Domain(error)) => {
                tracing::debug!(event_name = "tool.rejected", tool = name, error = %error);
                Ok(corrective_prompt(&error))
            }
            Err(ToolError::Application(error)) if error.is_fatal() => {
                tracing::error!(event_name = "tool.fatal", tool = name, error = %error);
                Err(anyhow::Error::new(error).context(format!("tool `{name}` failed")))
            }
            Err(ToolError::Application(error)) => {
                tracing::warn!(event_name = "tool.degraded", tool = name, error = %error);
                Ok(RETRY_LATER.to_string())
            }
        }
    }
}

pub struct SetDestination;

#[derive(Deserialize)]
struct DestinationArgs {
    destination: String,
}

#[async_trait]
impl Tool for SetDestination {
    fn name(&self) -> &'static str {
        "set_destination"
    }

    fn description(&self) -> &'static str {
        "Set the trip destination. It must be one of the catalog's cities."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: DestinationArgs = parse_args(self.name(), input)?;
        let destination = draft.set_destination(&services.catalog.hotels, &args.destination)?;
        let reply = format!("Destination set to {destination}.");
        Ok(with_next_prompt(reply, draft))
    }
}

pub struct SetOrigin;

#[derive(Deserialize)]
struct OriginArgs {
    origin: String,
}

#[async_trait]
impl Tool for SetOrigin {
    fn name(&self) -> &'static str {
        "set_origin"
    }

    fn description(&self) -> &'static str {
        "Set the city the trip starts from."
    }

    async fn execute(
        &self,
        _services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: OriginArgs = parse_args(self.name(), input)?;
        let reply = format!("Travelling from {}.", draft.set_origin(&args.origin)?);
        Ok(with_next_prompt(reply, draft))
    }
}

pub struct SetTravelDates;

#[derive(Deserialize)]
struct DatesArgs {
    dates: String,
}

#[async_trait]
impl Tool for SetTravelDates {
    fn name(&self) -> &'static str {
        "set_travel_dates"
    }

    fn description(&self) -> &'static str {
        "Record the travel dates as the user said them."
    }

    async fn execute(
        &self,
        _services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: DatesArgs = parse_args(self.name(), input)?;
        let reply = format!("Travel dates noted: {}.", draft.set_travel_dates(&args.dates)?);
        Ok(with_next_prompt(reply, draft))
    }
}

pub struct SetTravelers;

#[derive(Deserialize)]
struct TravelersArgs {
    adults: u32,
    #[serde(default)]
    children: u32,
}

#[async_trait]
impl Tool for SetTravelers {
    fn name(&self) -> &'static str {
        "set_travelers"
    }

    fn description(&self) -> &'static str {
        "Set the number of adults and children travelling."
    }

    async fn execute(
        &self,
        _services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: TravelersArgs = parse_args(self.name(), input)?;
        let count = draft.set_travelers(args.adults, args.children)?;
        let reply = format!(
            "{} traveler(s): {} adult(s) and {} child(ren).",
            count.total(),
            count.adults,
            count.children
        );
        Ok(with_next_prompt(reply, draft))
    }
}

pub struct SetBudget;

#[derive(Deserialize)]
struct BudgetArgs {
    budget: String,
}

#[async_trait]
impl Tool for SetBudget {
    fn name(&self) -> &'static str {
        "set_budget"
    }

    fn description(&self) -> &'static str {
        "Set the hotel budget tier: low, medium or high."
    }

    async fn execute(
        &self,
        _services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: BudgetArgs = parse_args(self.name(), input)?;
        let tier = draft.set_budget(&args.budget)?;
        Ok(format!("Budget set to {tier}."))
    }
}

pub struct SetAmenities;

#[derive(Deserialize)]
#[serde(untagged)]
enum AmenityInput {
    Text(String),
    List(Vec<String>),
}

#[derive(Deserialize)]
struct AmenitiesArgs {
    amenities: AmenityInput,
}

#[async_trait]
impl Tool for SetAmenities {
    fn name(&self) -> &'static str {
        "set_amenities"
    }

    fn description(&self) -> &'static str {
        "Set required hotel amenities as a comma separated list, or \"none\"."
    }

    async fn execute(
        &self,
        _services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: AmenitiesArgs = parse_args(self.name(), input)?;
        let raw = match args.amenities {
            AmenityInput::Text(text) => text,
            AmenityInput::List(items) => items.join(","),
        };
        let amenities = draft.set_amenities(&raw);
        if amenities.is_empty() {
            Ok("No amenity requirements.".to_string())
        } else {
            Ok(format!("Looking for hotels with {}.", amenities.join(", ")))
        }
    }
}

pub struct QuoteTransport;

#[derive(Deserialize)]
struct QuoteArgs {
    #[serde(default)]
    mode: Option<String>,
}

#[async_trait]
impl Tool for QuoteTransport {
    fn name(&self) -> &'static str {
        "quote_transport"
    }

    fn description(&self) -> &'static str {
        "Quote cost and duration for one travel mode, or for every mode when none is given."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: QuoteArgs = parse_args(self.name(), input)?;
        let route = draft.route("transport quote")?;

        let pricing = services.lifecycle.pricing();
        match args.mode {
            Some(mode) => {
                let mode = mode.parse::<TravelMode>()?;
                let quote = pricing.quote_transport(
                    route.origin,
                    route.destination,
                    mode,
                    route.travelers.total(),
                )?;
                Ok(describe_quote(&quote))
            }
            None => {
                let quotes =
                    pricing.compare_modes(route.origin, route.destination, route.travelers.total());
                Ok(quotes.iter().map(describe_quote).collect::<Vec<_>>().join(" "))
            }
        }
    }
}

pub struct SelectTransportMode;

#[derive(Deserialize)]
struct ModeArgs {
    mode: String,
}

#[async_trait]
impl Tool for SelectTransportMode {
    fn name(&self) -> &'static str {
        "select_transport_mode"
    }

    fn description(&self) -> &'static str {
        "Choose the travel mode: flight, train, bus or car."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: ModeArgs = parse_args(self.name(), input)?;
        let mode = args.mode.parse::<TravelMode>()?;
        draft.select_transport_mode(mode)?;

        let quote = draft.route("transport quote").ok().and_then(|route| {
            services
                .lifecycle
                .pricing()
                .quote_transport(route.origin, route.destination, mode, route.travelers.total())
                .ok()
        });
        let reply = match quote {
            Some(quote) => format!("Travelling by {mode}. {}", describe_quote(&quote)),
            None => format!("Travelling by {mode}."),
        };
        Ok(with_next_prompt(reply, draft))
    }
}

pub struct SuggestHotels;

#[derive(Deserialize)]
struct NoArgs {}

#[async_trait]
impl Tool for SuggestHotels {
    fn name(&self) -> &'static str {
        "suggest_hotels"
    }

    fn description(&self) -> &'static str {
        "Suggest up to three hotels at the destination using the budget and amenity preferences."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let _: NoArgs = parse_args(self.name(), input)?;
        draft.require("hotel suggestion", HOTEL_PREREQUISITES)?;
        let destination = draft.destination().unwrap_or_default();
        let suggestions = services.catalog.hotels.suggest(destination, draft.preferences())?;
        Ok(describe_suggestions(&suggestions))
    }
}

pub struct SelectHotel;

#[derive(Deserialize)]
struct HotelArgs {
    hotel_name: String,
}

#[async_trait]
impl Tool for SelectHotel {
    fn name(&self) -> &'static str {
        "select_hotel"
    }

    fn description(&self) -> &'static str {
        "Choose a hotel at the destination by its exact name."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: HotelArgs = parse_args(self.name(), input)?;
        let hotel = draft.select_hotel(&services.catalog.hotels, &args.hotel_name)?;
        let reply = format!("Staying at {} ({} stars).", hotel.name, hotel.rating);
        Ok(with_next_prompt(reply, draft))
    }
}

pub struct SetContactDetails;

#[derive(Deserialize)]
struct ContactArgs {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl Tool for SetContactDetails {
    fn name(&self) -> &'static str {
        "set_contact_details"
    }

    fn description(&self) -> &'static str {
        "Record any of the traveler's name, phone and email."
    }

    async fn execute(
        &self,
        _services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: ContactArgs = parse_args(self.name(), input)?;
        if args.name.is_none() && args.phone.is_none() && args.email.is_none() {
            return Err(ToolError::InvalidArguments {
                tool: self.name(),
                reason: "expected at least one of name, phone, email".to_string(),
            });
        }

        // Fields land together or not at all.
        let mut staged = draft.clone();
        let mut noted = Vec::new();
        if let Some(name) = args.name.as_deref() {
            noted.push(format!("name {}", staged.set_contact_name(name)?));
        }
        if let Some(phone) = args.phone.as_deref() {
            noted.push(format!("phone {}", staged.set_contact_phone(phone)?));
        }
        if let Some(email) = args.email.as_deref() {
            noted.push(format!("email {}", staged.set_contact_email(email)?));
        }
        *draft = staged;
        let reply = format!("Noted {}.", noted.join(", "));
        Ok(with_next_prompt(reply, draft))
    }
}

pub struct ConfirmBooking;

#[async_trait]
impl Tool for ConfirmBooking {
    fn name(&self) -> &'static str {
        "confirm_booking"
    }

    fn description(&self) -> &'static str {
        "Price and commit the booking once every required detail is collected."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let _: NoArgs = parse_args(self.name(), input)?;
        let confirmation = services.lifecycle.confirm(draft).await?;
        Ok(describe_confirmation(&confirmation))
    }
}

pub struct RetrieveBooking;

#[derive(Deserialize)]
struct BookingIdArgs {
    booking_id: String,
}

#[async_trait]
impl Tool for RetrieveBooking {
    fn name(&self) -> &'static str {
        "retrieve_booking"
    }

    fn description(&self) -> &'static str {
        "Look up an existing booking by its ID."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        _draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: BookingIdArgs = parse_args(self.name(), input)?;
        let record = services.lifecycle.retrieve(&args.booking_id).await?;
        Ok(describe_booking(&record))
    }
}

pub struct CancelBooking;

#[async_trait]
impl Tool for CancelBooking {
    fn name(&self) -> &'static str {
        "cancel_booking"
    }

    fn description(&self) -> &'static str {
        "Cancel a confirmed booking by its ID and report the refund."
    }

    async fn execute(
        &self,
        services: &BookingServices,
        _draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let args: BookingIdArgs = parse_args(self.name(), input)?;
        let outcome = services.lifecycle.cancel(&args.booking_id).await?;
        Ok(describe_cancellation(&outcome))
    }
}

pub struct BookingStatus;

#[async_trait]
impl Tool for BookingStatus {
    fn name(&self) -> &'static str {
        "booking_status"
    }

    fn description(&self) -> &'static str {
        "Summarize what has been collected and what is still missing."
    }

    async fn execute(
        &self,
        _services: &BookingServices,
        draft: &mut BookingDraft,
        input: Value,
    ) -> Result<String, ToolError> {
        let _: NoArgs = parse_args(self.name(), input)?;
        Ok(status_summary(draft))
    }
}
