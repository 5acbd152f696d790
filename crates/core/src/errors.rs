use thiserror::Error;

use crate::domain::booking::BookingStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown destination `{requested}`; available: {}", .available.join(", "))]
    UnknownDestination { requested: String, available: Vec<String> },
    #[error("invalid {field} `{value}`; expected one of {expected}")]
    InvalidEnum { field: String, value: String, expected: String },
    #[error("unknown travel mode `{requested}`; expected one of {expected}")]
    UnknownMode { requested: String, expected: String },
    #[error("{field} must not be empty")]
    EmptyValue { field: String },
    #[error("traveler count must be at least one (adults={adults}, children={children})")]
    InvalidTravelerCount { adults: u32, children: u32 },
    #[error("invalid {field}: {reason}")]
    InvalidContact { field: String, reason: String },
    #[error("no hotel catalog entry for `{destination}`")]
    NoCatalogEntry { destination: String },
    #[error("hotel `{requested}` not found in {destination}; available: {}", .available.join(", "))]
    HotelNotFound { destination: String, requested: String, available: Vec<String> },
    #[error("{operation} needs: {}", .missing.join(", "))]
    MissingPrerequisites { operation: String, missing: Vec<String> },
    #[error("booking is incomplete; missing: {}", .missing.join(", "))]
    IncompleteBooking { missing: Vec<String> },
    #[error("this conversation already confirmed booking {booking_id}")]
    AlreadyConfirmed { booking_id: String },
    #[error("booking {booking_id} not found")]
    BookingNotFound { booking_id: String },
    #[error("invalid booking transition from {from} to {to}")]
    InvalidBookingTransition { from: BookingStatus, to: BookingStatus },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("could not allocate a unique booking id after {attempts} attempts")]
    PersistenceExhausted { attempts: u32 },
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Fatal errors abort the turn instead of becoming a corrective reply.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PersistenceExhausted { .. } | Self::Configuration(_))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested booking does not exist.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error @ DomainError::BookingNotFound { .. }) => {
                Self::NotFound { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            error @ ApplicationError::PersistenceExhausted { .. } => {
                Self::Internal { message: error.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
