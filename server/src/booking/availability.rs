use crate::booking::validation::{FieldError, FieldErrorKind};
use crate::booking::{BookingError, ValidatedCandidate};
use crate::data_store::auth_token::AuthToken;
use crate::data_store::{models, LittleLemonStoreFacade, SlotOccupancy};

/// Number of tables per branch kept free for walk-in guests, if not configured otherwise
pub const DEFAULT_BUFFER_TABLES: i64 = 2;

/// Number of tables of a branch which can be booked in parallel. May be zero or negative, when the
/// buffer exceeds the table count. In this case no booking can be accepted.
pub fn capacity(table_count: i32, buffer_tables: i64) -> i64 {
    table_count as i64 - buffer_tables
}

/// Decide if another booking can be accepted when `overlapping_booked` BOOKED bookings already
/// overlap the requested time slot.
pub fn has_capacity(overlapping_booked: i64, table_count: i32, buffer_tables: i64) -> bool {
    overlapping_booked < capacity(table_count, buffer_tables)
}

/// Decide if a booking can be accepted in the observed state of its time slot: the user must not
/// hold another overlapping booking and the branch must have capacity left.
pub fn admits(slot: &SlotOccupancy, buffer_tables: i64) -> bool {
    !slot.user_has_overlap
        && has_capacity(slot.overlapping_booked, slot.table_count, buffer_tables)
}

/// Persist the validated booking candidate and decide about its confirmation.
///
/// The candidate is stored as PENDING booking first, so the attempt is kept in the database in any
/// case. Then, the overlapping BOOKED bookings of the branch and of the user are checked again
/// and the booking is moved to BOOKED or FAILED atomically (see
/// [LittleLemonStoreFacade::settle_pending_booking]). The branch's current table count is used,
/// not the one seen during validation.
///
/// Returns the BOOKED booking on success. When a concurrent request of the same user got the
/// overlapping slot first, the booking is FAILED and [BookingError::Validation] with a
/// duplicate-request error is returned. [BookingError::SlotUnavailable] with the FAILED booking
/// is returned when there is no capacity left and [BookingError::SystemFailure] if the decision
/// could not be completed. In the latter case, the booking is moved to FAILED on a best-effort
/// basis.
pub fn check_and_reserve(
    store: &mut dyn LittleLemonStoreFacade,
    auth_token: &AuthToken,
    candidate: ValidatedCandidate,
    buffer_tables: i64,
) -> Result<models::Booking, BookingError> {
    let branch_label = candidate.branch.branch.clone();
    let pending = store.create_pending_booking(
        auth_token,
        candidate.into_new_booking(models::new_booking_id()),
    )?;

    let admit = |slot: &SlotOccupancy| admits(slot, buffer_tables);
    match store.settle_pending_booking(auth_token, pending.id, &admit) {
        Ok((booking, _)) if booking.status == models::BookingStatus::Booked => {
            log::info!(
                "Booked table in branch {} on {} {}-{} (booking {}).",
                branch_label,
                booking.booking_date,
                booking.start_time,
                booking.end_time,
                booking.id
            );
            Ok(booking)
        }
        Ok((booking, slot)) if slot.user_has_overlap => {
            log::info!(
                "User {} already holds an overlapping booking on {} {}-{}. Booking {} failed.",
                booking.user_id,
                booking.booking_date,
                booking.start_time,
                booking.end_time,
                booking.id
            );
            Err(BookingError::Validation(vec![FieldError::new(
                FieldErrorKind::DuplicateRequest,
            )]))
        }
        Ok((booking, _)) => {
            log::info!(
                "No table available in branch {} on {} {}-{}. Booking {} failed.",
                branch_label,
                booking.booking_date,
                booking.start_time,
                booking.end_time,
                booking.id
            );
            Err(BookingError::SlotUnavailable(booking))
        }
        Err(e) => {
            log::error!(
                "Could not decide about availability for booking {}: {}",
                pending.id,
                e
            );
            if let Err(e2) = store.mark_booking_failed(auth_token, pending.id) {
                log::error!("Could not mark booking {} as failed: {}", pending.id, e2);
            }
            Err(BookingError::SystemFailure(e))
        }
    }
}
