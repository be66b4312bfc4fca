//! The backend part of the backend: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [LittleLemonStore] trait. This object can be shared between threads in
//! a global application state and be used to create [LittleLemonStoreFacade] instances for
//! interaction with the database. These provide a CRUD-like interface, using the data models from
//! the [models] module, plus the few atomic operations required by the booking engine.
//!
//! The primary implementation of [LittleLemonStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [LittleLemonStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the
//! Diesel query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests.

use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::setup;
use auth_token::{AuthToken, Privilege};
use chrono::{NaiveDate, NaiveTime};
use std::str::FromStr;

pub use auth_token::EnumMemberNotExistingError;

pub mod auth_token;
pub mod models;
mod postgres;
mod schema;

/// Get a [LittleLemonStore] instance, according the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PostgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl LittleLemonStore, CliError> {
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?)
        .map_err(|err| CliError::UnexpectedStoreError(err.to_string()))
}

pub type UserId = i32;
pub type BranchId = i32;
pub type BookingId = uuid::Uuid;
pub type MenuItemId = i32;
pub type HolidayId = i32;

pub trait LittleLemonStoreFacade {
    /// Get an [AuthToken] instance for a client, representing the roles of the session's user.
    ///
    /// Returns `Err(StoreError::NotExisting)` if the user of the session does not exist (anymore).
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError>;

    /// Get all users (for managers) or only the requesting user (for everyone else)
    fn get_users(
        &mut self,
        auth_token: &AuthToken,
        filter: ListFilter<UserOrderingField>,
    ) -> Result<Vec<models::User>, StoreError>;
    fn get_user(
        &mut self,
        auth_token: &AuthToken,
        user_id: UserId,
    ) -> Result<models::User, StoreError>;
    fn get_user_by_email(
        &mut self,
        auth_token: &AuthToken,
        email: &str,
    ) -> Result<models::User, StoreError>;
    fn create_user(
        &mut self,
        auth_token: &AuthToken,
        user: models::NewUser,
    ) -> Result<models::User, StoreError>;
    /// Update some fields of a user account.
    ///
    /// Users may update their own account, except for the `is_manager` flag, which requires the
    /// [Privilege::ManageUsers].
    fn update_user(
        &mut self,
        auth_token: &AuthToken,
        user_id: UserId,
        patch: models::UserPatch,
    ) -> Result<models::User, StoreError>;
    /// Delete a user account, together with all its bookings
    fn delete_user(&mut self, auth_token: &AuthToken, user_id: UserId) -> Result<(), StoreError>;

    /// Get all branches, ordered by their label (ascending by default)
    fn get_branches(
        &mut self,
        auth_token: &AuthToken,
        filter: ListFilter<BranchOrderingField>,
    ) -> Result<Vec<models::Branch>, StoreError>;
    fn get_branch(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
    ) -> Result<models::Branch, StoreError>;
    /// Look up a branch by its label (exact, case-sensitive match)
    fn get_branch_by_label(
        &mut self,
        auth_token: &AuthToken,
        label: &str,
    ) -> Result<models::Branch, StoreError>;
    /// Get the labels of all branches, in ascending order
    fn list_branch_labels(&mut self, auth_token: &AuthToken) -> Result<Vec<String>, StoreError>;
    fn create_branch(
        &mut self,
        auth_token: &AuthToken,
        branch: models::NewBranch,
    ) -> Result<models::Branch, StoreError>;
    fn update_branch(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
        branch: models::NewBranch,
    ) -> Result<models::Branch, StoreError>;
    /// Delete a branch. Fails with `StoreError::InvalidInputData` while bookings still reference
    /// the branch.
    fn delete_branch(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
    ) -> Result<(), StoreError>;

    /// Get a filtered list of bookings.
    ///
    /// Unless the filter is restricted to the requesting user's bookings, the
    /// [Privilege::ManageAllBookings] is required.
    fn get_bookings_filtered(
        &mut self,
        auth_token: &AuthToken,
        filter: BookingFilter,
    ) -> Result<Vec<models::FullBooking>, StoreError>;
    fn get_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<models::FullBooking, StoreError>;
    /// Check if the user has any active (PENDING or BOOKED) booking on the given date whose time
    /// interval overlaps [start, end), regardless of the branch.
    fn has_overlapping_active_booking(
        &mut self,
        auth_token: &AuthToken,
        user_id: UserId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<bool, StoreError>;
    /// Count the BOOKED bookings of the branch on the given date whose time interval overlaps
    /// [start, end). Back-to-back bookings do not overlap.
    fn count_overlapping_booked(
        &mut self,
        auth_token: &AuthToken,
        branch_id: BranchId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<i64, StoreError>;
    /// Persist a new booking in PENDING state. The booking's user must be the token's user.
    fn create_pending_booking(
        &mut self,
        auth_token: &AuthToken,
        booking: models::NewBooking,
    ) -> Result<models::Booking, StoreError>;
    /// Atomically decide about a PENDING booking: Observe the [SlotOccupancy] of the booking's
    /// time slot, pass it to `admit` and transition the booking to BOOKED, if it returns true, or
    /// FAILED otherwise. Returns the settled booking together with the observed occupancy.
    ///
    /// The observation and the status update are serialized against all other calls for the
    /// same (branch, date) pair and for the same (user, date) pair. Other calls don't block each
    /// other.
    ///
    /// Returns `Err(StoreError::ConcurrentEditConflict)` if the booking is not PENDING (anymore).
    fn settle_pending_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
        admit: &dyn Fn(&SlotOccupancy) -> bool,
    ) -> Result<(models::Booking, SlotOccupancy), StoreError>;
    /// Move a PENDING booking to FAILED. Used when the availability decision could not be
    /// completed.
    fn mark_booking_failed(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<(), StoreError>;
    /// Update fields of a booking, if the booking currently has the `expected_status`.
    ///
    /// Returns `Err(StoreError::ConcurrentEditConflict)` if the status has been changed in the
    /// meantime. Business rules for modifications are checked by
    /// [crate::booking::lifecycle], this only checks ownership or [Privilege::ManageAllBookings].
    fn update_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
        expected_status: models::BookingStatus,
        patch: models::BookingPatch,
    ) -> Result<models::FullBooking, StoreError>;
    fn delete_booking(
        &mut self,
        auth_token: &AuthToken,
        booking_id: BookingId,
    ) -> Result<(), StoreError>;
    /// Transition all BOOKED bookings with a booking date before `before` to COMPLETED.
    ///
    /// Returns the number of updated bookings.
    fn complete_bookings_before(
        &mut self,
        auth_token: &AuthToken,
        before: NaiveDate,
    ) -> Result<usize, StoreError>;

    /// Get the menu, optionally filtered by a search term (matching title or category,
    /// case-insensitive). This is public information, so no authorization is required.
    fn get_menu_items(
        &mut self,
        filter: ListFilter<MenuItemOrderingField>,
    ) -> Result<Vec<models::MenuItem>, StoreError>;
    fn get_menu_item(&mut self, menu_item_id: MenuItemId) -> Result<models::MenuItem, StoreError>;
    fn create_menu_item(
        &mut self,
        auth_token: &AuthToken,
        menu_item: models::NewMenuItem,
    ) -> Result<models::MenuItem, StoreError>;
    fn update_menu_item(
        &mut self,
        auth_token: &AuthToken,
        menu_item_id: MenuItemId,
        menu_item: models::NewMenuItem,
    ) -> Result<models::MenuItem, StoreError>;
    fn delete_menu_item(
        &mut self,
        auth_token: &AuthToken,
        menu_item_id: MenuItemId,
    ) -> Result<(), StoreError>;

    /// Get all holidays, in chronological order by default
    fn get_holidays(
        &mut self,
        auth_token: &AuthToken,
        filter: ListFilter<HolidayOrderingField>,
    ) -> Result<Vec<models::Holiday>, StoreError>;
    fn get_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday_id: HolidayId,
    ) -> Result<models::Holiday, StoreError>;
    fn create_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday: models::NewHoliday,
    ) -> Result<models::Holiday, StoreError>;
    fn update_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday_id: HolidayId,
        holiday: models::NewHoliday,
    ) -> Result<models::Holiday, StoreError>;
    fn delete_holiday(
        &mut self,
        auth_token: &AuthToken,
        holiday_id: HolidayId,
    ) -> Result<(), StoreError>;
}

/// State of a booking's time slot, as observed by
/// [LittleLemonStoreFacade::settle_pending_booking] while holding the slot's locks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOccupancy {
    /// Current table count of the booking's branch
    pub table_count: i32,
    /// Number of BOOKED bookings of the branch which overlap the time slot
    pub overlapping_booked: i64,
    /// The booking's user already has another BOOKED booking overlapping the time slot, in any
    /// branch
    pub user_has_overlap: bool,
}

/// Check if two time intervals [a_start, a_end) and [b_start, b_end) overlap.
///
/// Intervals are half-open: an interval ending at 12:00 does not overlap with one starting at
/// 12:00.
pub fn intervals_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Fields of an entity which list queries can be sorted by
pub trait OrderingField: Sized + Copy + Default + 'static {
    /// Name of the field enum, for error messages
    const ENUM_NAME: &'static str;
    /// The fields with their names in ordering expressions
    const FIELD_NAMES: &'static [(&'static str, Self)];
}

/// Sort order of a list query: the field and the direction
///
/// Parsed from ordering expressions like "booking_date" or "-status" (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ordering<F> {
    pub field: F,
    pub descending: bool,
}

impl<F: OrderingField> FromStr for Ordering<F> {
    type Err = EnumMemberNotExistingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, field_name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        F::FIELD_NAMES
            .iter()
            .find(|(name, _)| *name == field_name)
            .map(|(_, field)| Self {
                field: *field,
                descending,
            })
            .ok_or_else(|| EnumMemberNotExistingError {
                member_value: s.to_owned(),
                enum_name: F::ENUM_NAME,
            })
    }
}

impl<F> Ordering<F> {
    /// Apply the direction to the ascending comparison result of two entities
    pub fn directed(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingOrderingField {
    #[default]
    CreatedAt,
    Name,
    BookingDate,
    Status,
}

impl OrderingField for BookingOrderingField {
    const ENUM_NAME: &'static str = "BookingOrdering";
    const FIELD_NAMES: &'static [(&'static str, Self)] = &[
        ("created_at", Self::CreatedAt),
        ("name", Self::Name),
        ("booking_date", Self::BookingDate),
        ("status", Self::Status),
    ];
}

pub type BookingOrdering = Ordering<BookingOrderingField>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuItemOrderingField {
    #[default]
    Id,
    Title,
    Description,
    Category,
    Price,
    Inventory,
}

impl OrderingField for MenuItemOrderingField {
    const ENUM_NAME: &'static str = "MenuItemOrdering";
    const FIELD_NAMES: &'static [(&'static str, Self)] = &[
        ("title", Self::Title),
        ("description", Self::Description),
        ("category", Self::Category),
        ("price", Self::Price),
        ("inventory", Self::Inventory),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserOrderingField {
    #[default]
    Id,
    Email,
    FirstName,
    LastName,
    IsManager,
}

impl OrderingField for UserOrderingField {
    const ENUM_NAME: &'static str = "UserOrdering";
    const FIELD_NAMES: &'static [(&'static str, Self)] = &[
        ("email", Self::Email),
        ("first_name", Self::FirstName),
        ("last_name", Self::LastName),
        ("is_manager", Self::IsManager),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchOrderingField {
    #[default]
    Branch,
}

impl OrderingField for BranchOrderingField {
    const ENUM_NAME: &'static str = "BranchOrdering";
    const FIELD_NAMES: &'static [(&'static str, Self)] = &[("branch", Self::Branch)];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HolidayOrderingField {
    #[default]
    HolidayDate,
    Description,
}

impl OrderingField for HolidayOrderingField {
    const ENUM_NAME: &'static str = "HolidayOrdering";
    const FIELD_NAMES: &'static [(&'static str, Self)] = &[
        ("holiday_date", Self::HolidayDate),
        ("description", Self::Description),
    ];
}

/// Search and sort options for the simple entity lists (menu items, users, branches, holidays)
///
/// The fields matched by `search` (case-insensitive substring) depend on the entity:
/// * menu items: title, category
/// * users: email, first name, last name, phone number
/// * branches: branch label, phone
/// * holidays: description, or the exact date when the search term is an ISO date
#[derive(Debug, Default, Clone)]
pub struct ListFilter<F> {
    pub search: Option<String>,
    pub ordering: Ordering<F>,
}

impl<F> ListFilter<F> {
    fn search_lowercase(&self) -> Option<String> {
        self.search.as_ref().map(|s| s.to_lowercase())
    }

    /// Check the menu item against the search term
    pub fn matches_menu_item(&self, item: &models::MenuItem) -> bool {
        match self.search_lowercase() {
            Some(search) => {
                item.title.to_lowercase().contains(&search)
                    || item.category.to_lowercase().contains(&search)
            }
            None => true,
        }
    }

    /// Check the user against the search term
    pub fn matches_user(&self, user: &models::User) -> bool {
        match self.search_lowercase() {
            Some(search) => {
                user.email.to_lowercase().contains(&search)
                    || user.first_name.to_lowercase().contains(&search)
                    || user.last_name.to_lowercase().contains(&search)
                    || user
                        .phone_number
                        .as_ref()
                        .is_some_and(|p| p.contains(&search))
            }
            None => true,
        }
    }

    /// Check the branch against the search term
    pub fn matches_branch(&self, branch: &models::Branch) -> bool {
        match self.search_lowercase() {
            Some(search) => {
                branch.branch.to_lowercase().contains(&search) || branch.phone.contains(&search)
            }
            None => true,
        }
    }

    /// Check the holiday against the search term
    pub fn matches_holiday(&self, holiday: &models::Holiday) -> bool {
        match self.search_lowercase() {
            Some(search) => {
                holiday.description.to_lowercase().contains(&search)
                    || search.parse::<NaiveDate>().ok() == Some(holiday.holiday_date)
            }
            None => true,
        }
    }
}

/// Filter options for retrieving bookings from the store via
/// [LittleLemonStoreFacade::get_bookings_filtered]
#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    /// Only include bookings of the given user
    pub user: Option<UserId>,
    /// Only include bookings whose guest name, phone or user email contain the given string
    /// (case-insensitive)
    pub search: Option<String>,
    /// Only include bookings of the given branch
    pub branch: Option<BranchId>,
    /// Only include bookings on the given date
    pub date: Option<NaiveDate>,
    pub ordering: BookingOrdering,
}

impl BookingFilter {
    /// Checks if a given booking matches the filter
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual bookings in software.
    pub fn matches(&self, booking: &models::FullBooking) -> bool {
        if let Some(user) = self.user {
            if booking.booking.user_id != user {
                return false;
            }
        }
        if let Some(branch) = self.branch {
            if booking.booking.branch_id != branch {
                return false;
            }
        }
        if let Some(date) = self.date {
            if booking.booking.booking_date != date {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let search = search.to_lowercase();
            if !booking.booking.name.to_lowercase().contains(&search)
                && !booking.booking.phone.contains(&search)
                && !booking.user_email.to_lowercase().contains(&search)
            {
                return false;
            }
        }
        true
    }
}

pub trait LittleLemonStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn LittleLemonStoreFacade + 'a>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created because it already exists (i.e. violates a uniqueness
    /// constraint)
    ConflictEntityExists,
    /// The entity has not been updated because it has been changed concurrently.
    ConcurrentEditConflict,
    /// The client is not authorized for this action. It would need to authenticate for an access
    /// role qualifying for the `required_privilege`.
    PermissionDenied { required_privilege: Privilege },
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                e @ diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | e @ diesel::result::DatabaseErrorKind::CheckViolation,
                info,
            ) => Self::InvalidInputData(
                info.constraint_name()
                    .and_then(postgres::description_for_postgres_constraint)
                    .map(|d| d.to_owned())
                    .unwrap_or_else(|| format!("{:?}", e)),
            ),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::ConcurrentEditConflict => f.write_str("Updating the entity has been rejected, because it has been changed concurrently."),
            Self::PermissionDenied { required_privilege } => {
                write!(f, "Client is not authorized to perform this action. {:?} privilege required.", required_privilege)
            }
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            Self::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            }
        }
    }
}

impl std::error::Error for StoreError {}
