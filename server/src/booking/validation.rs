use crate::booking::BookingError;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::{models, BookingId, LittleLemonStoreFacade, StoreError, UserId};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use lazy_static::lazy_static;
use littlelemon_api_types::BookingRequest;

pub const MIN_GUEST_COUNT: i32 = 1;
pub const MAX_GUEST_COUNT: i32 = 10;
pub const MAX_MESSAGE_LENGTH: usize = 255;
/// Bookings must start at least this many minutes before the branch closes
pub const LAST_START_MINUTES_BEFORE_CLOSING: i64 = 30;

/// Kinds of problems with a booking request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    InvalidPhone,
    InvalidGuestCount,
    MissingName,
    MessageTooLong,
    UnknownBranch,
    PastDate,
    StartOutOfHours,
    EndOutOfHours,
    EndBeforeStart,
    DuplicateRequest,
}

impl FieldErrorKind {
    /// Machine-readable error code, as used in the API's error responses
    pub fn code(&self) -> &'static str {
        match self {
            FieldErrorKind::InvalidPhone => "invalid_phone",
            FieldErrorKind::InvalidGuestCount => "invalid_guest_count",
            FieldErrorKind::MissingName => "missing_name",
            FieldErrorKind::MessageTooLong => "message_too_long",
            FieldErrorKind::UnknownBranch => "unknown_branch",
            FieldErrorKind::PastDate => "past_date",
            FieldErrorKind::StartOutOfHours => "start_out_of_hours",
            FieldErrorKind::EndOutOfHours => "end_out_of_hours",
            FieldErrorKind::EndBeforeStart => "end_before_start",
            FieldErrorKind::DuplicateRequest => "duplicate_request",
        }
    }

    /// The request field which the problem is attributed to
    pub fn field(&self) -> &'static str {
        match self {
            FieldErrorKind::InvalidPhone => "phone",
            FieldErrorKind::InvalidGuestCount => "no_of_guests",
            FieldErrorKind::MissingName => "name",
            FieldErrorKind::MessageTooLong => "message",
            FieldErrorKind::UnknownBranch => "branch",
            FieldErrorKind::PastDate => "booking_date",
            FieldErrorKind::StartOutOfHours => "start_time",
            FieldErrorKind::EndOutOfHours | FieldErrorKind::EndBeforeStart => "end_time",
            FieldErrorKind::DuplicateRequest => "non_field_errors",
        }
    }
}

/// A single problem with a booking request, including the context for a human-readable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
    /// Working hours of the branch, for the out-of-hours messages
    hours: Option<(NaiveTime, NaiveTime)>,
}

impl FieldError {
    pub(crate) fn new(kind: FieldErrorKind) -> Self {
        Self {
            field: kind.field(),
            kind,
            hours: None,
        }
    }

    fn with_hours(kind: FieldErrorKind, branch: &models::Branch) -> Self {
        Self {
            field: kind.field(),
            kind,
            hours: Some((branch.opening_time, branch.closing_time)),
        }
    }

    pub fn message(&self) -> String {
        let hours = self
            .hours
            .map(|(opening, closing)| {
                format!(" {} - {}", opening.format("%H:%M"), closing.format("%H:%M"))
            })
            .unwrap_or_default();
        match self.kind {
            FieldErrorKind::InvalidPhone => "Phone number must be exactly 10 digits.".to_owned(),
            FieldErrorKind::InvalidGuestCount => format!(
                "Number of guests must be between {} and {}.",
                MIN_GUEST_COUNT, MAX_GUEST_COUNT
            ),
            FieldErrorKind::MissingName => "Name must not be empty.".to_owned(),
            FieldErrorKind::MessageTooLong => format!(
                "Message must not be longer than {} characters.",
                MAX_MESSAGE_LENGTH
            ),
            FieldErrorKind::UnknownBranch => {
                "Invalid branch. See /api/v1/bookings/branches for available branches.".to_owned()
            }
            FieldErrorKind::PastDate => "Booking date must be today or in the future.".to_owned(),
            FieldErrorKind::StartOutOfHours => format!(
                "Start time must be within the restaurant's working hours, at least {} minutes before closing.{}",
                LAST_START_MINUTES_BEFORE_CLOSING,
                hours
            ),
            FieldErrorKind::EndOutOfHours => {
                format!("End time must be within the restaurant's working hours.{}", hours)
            }
            FieldErrorKind::EndBeforeStart => "End time must be later than start time.".to_owned(),
            FieldErrorKind::DuplicateRequest => {
                "You already have a booking that overlaps with this time slot.".to_owned()
            }
        }
    }
}

impl From<&FieldError> for littlelemon_api_types::FieldError {
    fn from(value: &FieldError) -> Self {
        Self {
            field: value.field.to_owned(),
            code: value.kind.code().to_owned(),
            message: value.message(),
        }
    }
}

/// A booking request which passed all checks, together with the resolved branch
#[derive(Debug, Clone)]
pub struct ValidatedCandidate {
    pub user_id: UserId,
    pub branch: models::Branch,
    pub name: String,
    pub phone: String,
    pub guest_count: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub message: String,
}

impl ValidatedCandidate {
    pub fn into_new_booking(self, id: BookingId) -> models::NewBooking {
        models::NewBooking {
            id,
            user_id: self.user_id,
            branch_id: self.branch.id,
            name: self.name,
            phone: self.phone,
            guest_count: self.guest_count,
            booking_date: self.booking_date,
            start_time: self.start_time,
            end_time: self.end_time,
            message: self.message,
        }
    }
}

/// Validate a booking request of the user identified by `auth_token`.
///
/// All problems are collected and returned together as [BookingError::Validation]. `today` is the
/// current date in the restaurant's timezone. The function has no side effects, so validating the
/// same request again yields the same result (as long as the database does not change).
pub fn validate_booking_request(
    store: &mut dyn LittleLemonStoreFacade,
    auth_token: &AuthToken,
    request: BookingRequest,
    today: NaiveDate,
) -> Result<ValidatedCandidate, BookingError> {
    let user_id = auth_token.check_privilege_for_user(Privilege::BookTables)?;
    let branch = match store.get_branch_by_label(auth_token, &request.branch) {
        Ok(branch) => Some(branch),
        Err(StoreError::NotExisting) => None,
        Err(e) => return Err(e.into()),
    };

    let mut errors = check_fields(&request, branch.as_ref(), today);
    if request.start_time < request.end_time
        && store.has_overlapping_active_booking(
            auth_token,
            user_id,
            request.booking_date,
            request.start_time,
            request.end_time,
        )?
    {
        errors.push(FieldError::new(FieldErrorKind::DuplicateRequest));
    }

    match branch {
        Some(branch) if errors.is_empty() => Ok(ValidatedCandidate {
            user_id,
            branch,
            name: request.name.trim().to_owned(),
            phone: request.phone,
            guest_count: request.guest_count,
            booking_date: request.booking_date,
            start_time: request.start_time,
            end_time: request.end_time,
            message: request.message,
        }),
        _ => Err(BookingError::Validation(errors)),
    }
}

/// Check all fields of the booking request, which can be checked without querying the database.
///
/// `branch` is the branch referenced by the request, if it exists. Without a branch, the checks
/// against the working hours are skipped.
pub fn check_fields(
    request: &BookingRequest,
    branch: Option<&models::Branch>,
    today: NaiveDate,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_phone(&request.phone) {
        errors.push(FieldError::new(FieldErrorKind::InvalidPhone));
    }
    if !(MIN_GUEST_COUNT..=MAX_GUEST_COUNT).contains(&request.guest_count) {
        errors.push(FieldError::new(FieldErrorKind::InvalidGuestCount));
    }
    if request.name.trim().is_empty() {
        errors.push(FieldError::new(FieldErrorKind::MissingName));
    }
    if request.message.chars().count() > MAX_MESSAGE_LENGTH {
        errors.push(FieldError::new(FieldErrorKind::MessageTooLong));
    }
    if request.booking_date < today {
        errors.push(FieldError::new(FieldErrorKind::PastDate));
    }

    match branch {
        None => errors.push(FieldError::new(FieldErrorKind::UnknownBranch)),
        Some(branch) => {
            if !is_valid_start_time(request.start_time, branch) {
                errors.push(FieldError::with_hours(
                    FieldErrorKind::StartOutOfHours,
                    branch,
                ));
            }
            if request.end_time <= request.start_time {
                errors.push(FieldError::new(FieldErrorKind::EndBeforeStart));
            } else if request.end_time < branch.opening_time
                || request.end_time > branch.closing_time
            {
                errors.push(FieldError::with_hours(FieldErrorKind::EndOutOfHours, branch));
            }
        }
    }
    errors
}

/// Check if a booking may start at `start` in the given branch, i.e. `start` is within
/// [opening, closing - 30 min].
pub fn is_valid_start_time(start: NaiveTime, branch: &models::Branch) -> bool {
    let (latest_start, wrapped) = branch
        .closing_time
        .overflowing_sub_signed(TimeDelta::minutes(LAST_START_MINUTES_BEFORE_CLOSING));
    wrapped == 0 && start >= branch.opening_time && start <= latest_start
}

/// Check if the value is a phone number in the expected format of exactly 10 ASCII digits
pub fn is_valid_phone(value: &str) -> bool {
    lazy_static! {
        static ref RE: regex::Regex = regex::Regex::new(r"^[0-9]{10}$").unwrap();
    }
    RE.is_match(value)
}
