pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod notification;
pub mod pricing;
pub mod store;

pub use catalog::fares::{DistanceSource, FareTable};
pub use catalog::hotels::{EligibilityPolicy, HotelCatalog, HotelSuggestions, SuggestionOrigin};
pub use catalog::{CatalogError, ReferenceCatalog};
pub use domain::booking::{BookingId, BookingRecord, BookingStatus};
pub use domain::contact::{ContactDetails, CustomerContact};
pub use domain::draft::{BookingDraft, Slot};
pub use domain::hotel::Hotel;
pub use domain::travel::{BudgetTier, TravelMode, TravelPreferences, TravelerCount};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use lifecycle::id::{BookingIdGenerator, RandomBookingIdGenerator, SequenceIdGenerator};
pub use lifecycle::{BookingLifecycle, CancellationOutcome, Confirmation, LifecycleSettings};
pub use notification::{
    BookingCommitHook, DisabledNotifications, InMemoryTransport,
    NotificationDispatcher, NotificationError, NotificationMessage, NotificationOutcome,
    NotificationTransport,
};
pub use pricing::{CatalogPricingEngine, PricingEngine, TransportQuote, TripTotals};
pub use store::{BookingStore, BookingUpdate, InMemoryBookingStore, StoreError};
