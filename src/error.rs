// Error types for the booking engine and its stores

use thiserror::Error;

use crate::model::BookingStatus;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    #[error("Check-in date cannot be in the past")]
    InvalidCheckIn,

    #[error("Check-out date must be after check-in date")]
    InvalidCheckOut,

    #[error("Invalid booking data: {0}")]
    Validation(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(String),

    #[error("Cannot change booking status from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl BookingError {
    // Stable name for logs and API clients
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::DestinationNotFound(_) => "destination_not_found",
            BookingError::InvalidCheckIn => "invalid_check_in",
            BookingError::InvalidCheckOut => "invalid_check_out",
            BookingError::Validation(_) => "validation",
            BookingError::BookingNotFound(_) => "booking_not_found",
            BookingError::AlreadyCancelled(_) => "already_cancelled",
            BookingError::IllegalTransition { .. } => "illegal_transition",
            BookingError::Persistence(_) => "persistence_failure",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::DestinationNotFound(_) | BookingError::BookingNotFound(_) => 404,
            BookingError::InvalidCheckIn
            | BookingError::InvalidCheckOut
            | BookingError::Validation(_)
            | BookingError::AlreadyCancelled(_) => 400,
            BookingError::IllegalTransition { .. } => 409,
            BookingError::Persistence(_) => 500,
        }
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BookingError::Validation(errors.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Booking code already exists: {0}")]
    DuplicateCode(String),

    #[error("Booking {code} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        code: String,
        expected: u64,
        found: u64,
    },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type BookingResult<T> = Result<T, BookingError>;
pub type StoreResult<T> = Result<T, StoreError>;
