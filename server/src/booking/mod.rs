//! The booking engine: validation of booking requests and the slot availability decision
//!
//! A booking request passes through [validate_booking_request], which collects all field-level
//! problems and resolves the branch. The resulting [ValidatedCandidate] is handed to
//! [check_and_reserve], which persists it as PENDING booking and atomically decides about
//! BOOKED or FAILED, based on the overlapping BOOKED bookings of the branch and of the user.
//!
//! Modifications of existing bookings (owner edits, cancellation, manager status changes,
//! deletion) are governed by the [lifecycle] module.

use crate::data_store::{models, StoreError};
use std::fmt::{Display, Formatter};

pub mod availability;
pub mod lifecycle;
pub mod validation;

pub use availability::{capacity, check_and_reserve, has_capacity, DEFAULT_BUFFER_TABLES};
pub use validation::{validate_booking_request, FieldError, FieldErrorKind, ValidatedCandidate};

#[derive(Debug)]
pub enum BookingError {
    /// The booking request is invalid. Contains all detected problems.
    Validation(Vec<FieldError>),
    /// There are not enough free tables in the requested time slot. The attempt has been
    /// persisted as FAILED booking, which is included here.
    SlotUnavailable(models::Booking),
    /// The booking date of an existing booking is in the past, so it must not be modified.
    PastBooking,
    /// The requested status change is not allowed from the booking's current status.
    InvalidStatusChange {
        from: models::BookingStatus,
        to: models::BookingStatus,
    },
    /// The requesting client may not perform this kind of change on the booking.
    ChangeNotPermitted(&'static str),
    /// Unexpected failure during the availability decision. The PENDING booking has been moved
    /// to FAILED (if possible).
    SystemFailure(StoreError),
    /// Error from the data store, before the booking has been persisted or while modifying an
    /// existing booking
    Store(StoreError),
}

impl From<StoreError> for BookingError {
    fn from(value: StoreError) -> Self {
        BookingError::Store(value)
    }
}

impl Display for BookingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::Validation(errors) => {
                write!(f, "Invalid booking request:")?;
                for error in errors {
                    write!(f, " {}: {}", error.field, error.message())?;
                }
                Ok(())
            }
            BookingError::SlotUnavailable(_) => {
                f.write_str("No tables available in the requested time slot.")
            }
            BookingError::PastBooking => f.write_str("Past bookings cannot be modified."),
            BookingError::InvalidStatusChange { from, to } => {
                write!(f, "Booking status cannot be changed from {} to {}.", from, to)
            }
            BookingError::ChangeNotPermitted(reason) => f.write_str(reason),
            BookingError::SystemFailure(e) => write!(f, "Booking could not be completed: {}", e),
            BookingError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BookingError {}
