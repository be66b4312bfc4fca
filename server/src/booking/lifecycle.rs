use crate::booking::validation::{
    is_valid_phone, FieldError, FieldErrorKind, MAX_GUEST_COUNT, MAX_MESSAGE_LENGTH,
    MIN_GUEST_COUNT,
};
use crate::booking::BookingError;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::{models, BookingId, LittleLemonStoreFacade};
use chrono::NaiveDate;

/// Apply a client's modification to an existing booking.
///
/// Rules:
/// * bookings with a booking date before `today` cannot be modified
/// * only the owner may change the booking details (name, phone, guests, message), and only
///   while the booking is active (PENDING or BOOKED)
/// * the owner may cancel a BOOKED booking, managers may also mark it as COMPLETED
/// * all other status changes are rejected
pub fn update_booking(
    store: &mut dyn LittleLemonStoreFacade,
    auth_token: &AuthToken,
    booking_id: BookingId,
    mut patch: models::BookingPatch,
    today: NaiveDate,
) -> Result<models::FullBooking, BookingError> {
    let current = store.get_booking(auth_token, booking_id)?;
    let booking = &current.booking;
    if booking.booking_date < today {
        return Err(BookingError::PastBooking);
    }

    if patch.changes_booking_details() {
        if auth_token.user_id() != Some(booking.user_id) {
            return Err(BookingError::ChangeNotPermitted(
                "Only the owner may change the details of a booking.",
            ));
        }
        if !booking.status.is_active() {
            return Err(BookingError::ChangeNotPermitted(
                "Only pending or booked bookings can be changed.",
            ));
        }
        let errors = check_patch_fields(&patch);
        if !errors.is_empty() {
            return Err(BookingError::Validation(errors));
        }
    }

    if patch.status == Some(booking.status) {
        patch.status = None;
    }
    if let Some(new_status) = patch.status {
        if !booking.status.can_be_changed_to(new_status) {
            return Err(BookingError::InvalidStatusChange {
                from: booking.status,
                to: new_status,
            });
        }
        if new_status != models::BookingStatus::Canceled
            && !auth_token.has_privilege(Privilege::ManageAllBookings)
        {
            return Err(BookingError::ChangeNotPermitted(
                "Only managers may change the status of a booking, except for cancelling it.",
            ));
        }
    }

    let updated = store.update_booking(auth_token, booking_id, booking.status, patch)?;
    if updated.booking.status != booking.status {
        log::info!(
            "Booking {} changed from {} to {}.",
            booking_id,
            booking.status,
            updated.booking.status
        );
    }
    Ok(updated)
}

/// Delete a booking, unless its booking date is before `today`.
pub fn delete_booking(
    store: &mut dyn LittleLemonStoreFacade,
    auth_token: &AuthToken,
    booking_id: BookingId,
    today: NaiveDate,
) -> Result<(), BookingError> {
    let current = store.get_booking(auth_token, booking_id)?;
    if current.booking.booking_date < today {
        return Err(BookingError::PastBooking);
    }
    store.delete_booking(auth_token, booking_id)?;
    log::info!("Booking {} deleted.", booking_id);
    Ok(())
}

/// Mark all BOOKED bookings with a booking date before `today` as COMPLETED.
pub fn complete_past_bookings(
    store: &mut dyn LittleLemonStoreFacade,
    auth_token: &AuthToken,
    today: NaiveDate,
) -> Result<usize, BookingError> {
    let count = store.complete_bookings_before(auth_token, today)?;
    log::info!("Marked {} past bookings as completed.", count);
    Ok(count)
}

fn check_patch_fields(patch: &models::BookingPatch) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Some(phone) = &patch.phone {
        if !is_valid_phone(phone) {
            errors.push(FieldError::new(FieldErrorKind::InvalidPhone));
        }
    }
    if let Some(guest_count) = patch.guest_count {
        if !(MIN_GUEST_COUNT..=MAX_GUEST_COUNT).contains(&guest_count) {
            errors.push(FieldError::new(FieldErrorKind::InvalidGuestCount));
        }
    }
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            errors.push(FieldError::new(FieldErrorKind::MissingName));
        }
    }
    if let Some(message) = &patch.message {
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            errors.push(FieldError::new(FieldErrorKind::MessageTooLong));
        }
    }
    errors
}
