use crate::data_store::{BookingId, BranchId, EnumMemberNotExistingError, UserId};
use chrono::{naive::NaiveDate, DateTime, NaiveTime, Utc};
use diesel::deserialize::FromSql;
use diesel::prelude::*;
use diesel::query_builder::bind_collector::RawBytesBindCollector;
use diesel::serialize::ToSql;
use diesel::{AsExpression, FromSqlRow};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::restaurant_branches)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub branch: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub table_count: i32,
}

impl From<Branch> for littlelemon_api_types::Branch {
    fn from(value: Branch) -> Self {
        Self {
            id: value.id,
            name: value.name,
            branch: value.branch,
            address: value.address,
            phone: value.phone,
            email: value.email,
            opening_time: value.opening_time,
            closing_time: value.closing_time,
            table_count: value.table_count,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::restaurant_branches)]
pub struct NewBranch {
    pub name: String,
    pub branch: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub table_count: i32,
}

impl From<littlelemon_api_types::Branch> for NewBranch {
    fn from(value: littlelemon_api_types::Branch) -> Self {
        Self {
            name: value.name,
            branch: value.branch,
            address: value.address,
            phone: value.phone,
            email: value.email,
            opening_time: value.opening_time,
            closing_time: value.closing_time,
            table_count: value.table_count,
        }
    }
}

/// Canonical status of a booking. It is stored and serialized as upper-case string everywhere.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromSqlRow, AsExpression)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum BookingStatus {
    /// Provisional state after validation, before the availability decision
    Pending,
    Booked,
    Failed,
    Canceled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Booked => "BOOKED",
            BookingStatus::Failed => "FAILED",
            BookingStatus::Canceled => "CANCELED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    /// Bookings in these states block the owner from requesting an overlapping time slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Booked)
    }

    /// Check if a booking may be moved from this status to `next` by a status update (i.e.
    /// outside of the availability decision, which is the only way to leave PENDING).
    pub fn can_be_changed_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Booked, BookingStatus::Canceled)
                | (BookingStatus::Booked, BookingStatus::Completed)
        )
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = EnumMemberNotExistingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "BOOKED" => Ok(BookingStatus::Booked),
            "FAILED" => Ok(BookingStatus::Failed),
            "CANCELED" => Ok(BookingStatus::Canceled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            value => Err(EnumMemberNotExistingError {
                member_value: value.to_owned(),
                enum_name: "BookingStatus",
            }),
        }
    }
}

impl From<BookingStatus> for littlelemon_api_types::BookingStatus {
    fn from(value: BookingStatus) -> Self {
        match value {
            BookingStatus::Pending => Self::Pending,
            BookingStatus::Booked => Self::Booked,
            BookingStatus::Failed => Self::Failed,
            BookingStatus::Canceled => Self::Canceled,
            BookingStatus::Completed => Self::Completed,
        }
    }
}

impl From<littlelemon_api_types::BookingStatus> for BookingStatus {
    fn from(value: littlelemon_api_types::BookingStatus) -> Self {
        match value {
            littlelemon_api_types::BookingStatus::Pending => Self::Pending,
            littlelemon_api_types::BookingStatus::Booked => Self::Booked,
            littlelemon_api_types::BookingStatus::Failed => Self::Failed,
            littlelemon_api_types::BookingStatus::Canceled => Self::Canceled,
            littlelemon_api_types::BookingStatus::Completed => Self::Completed,
        }
    }
}

impl<DB> ToSql<diesel::sql_types::Text, DB> for BookingStatus
where
    DB: diesel::backend::Backend,
    for<'c> &'c str: ToSql<diesel::sql_types::Text, DB>,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        <str as ToSql<diesel::sql_types::Text, DB>>::to_sql(self.as_str(), &mut out.reborrow())
    }
}

impl<DB> FromSql<diesel::sql_types::Text, DB> for BookingStatus
where
    DB: diesel::backend::Backend,
    String: FromSql<diesel::sql_types::Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let x = String::from_sql(bytes)?;
        x.parse()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::bookings)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub name: String,
    pub phone: String,
    pub guest_count: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub message: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// A booking together with the label of its branch, as presented to clients
#[derive(Clone, Debug)]
pub struct FullBooking {
    pub booking: Booking,
    pub branch_label: String,
    pub user_email: String,
}

impl From<FullBooking> for littlelemon_api_types::Booking {
    fn from(value: FullBooking) -> Self {
        Self {
            id: value.booking.id,
            user: value.booking.user_id,
            branch: value.branch_label,
            name: value.booking.name,
            phone: value.booking.phone,
            guest_count: value.booking.guest_count,
            booking_date: value.booking.booking_date,
            start_time: value.booking.start_time,
            end_time: value.booking.end_time,
            message: value.booking.message,
            status: value.booking.status.into(),
            created_at: value.booking.created_at,
        }
    }
}

/// Data for inserting a new booking.
///
/// There is intentionally no status field: new bookings always start as
/// [BookingStatus::Pending] (database column default) and may only leave this state through
/// [crate::data_store::LittleLemonStoreFacade::settle_pending_booking].
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::bookings)]
pub struct NewBooking {
    pub id: BookingId,
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub name: String,
    pub phone: String,
    pub guest_count: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub message: String,
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name=super::schema::bookings)]
pub struct BookingPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub guest_count: Option<i32>,
    pub message: Option<String>,
    pub status: Option<BookingStatus>,
}

impl From<littlelemon_api_types::BookingPatch> for BookingPatch {
    fn from(value: littlelemon_api_types::BookingPatch) -> Self {
        Self {
            name: value.name,
            phone: value.phone,
            guest_count: value.guest_count,
            message: value.message,
            status: value.status.map(|s| s.into()),
        }
    }
}

impl BookingPatch {
    /// True if the patch changes anything else than the booking's status
    pub fn changes_booking_details(&self) -> bool {
        self.name.is_some()
            || self.phone.is_some()
            || self.guest_count.is_some()
            || self.message.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.changes_booking_details() && self.status.is_none()
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::menu_items)]
pub struct MenuItem {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_cents: i32,
    pub inventory: i32,
    pub image_filename: String,
}

impl From<MenuItem> for littlelemon_api_types::MenuItem {
    fn from(value: MenuItem) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            category: value.category,
            price_cents: value.price_cents,
            inventory: value.inventory,
            image_filename: value.image_filename,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::menu_items)]
pub struct NewMenuItem {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_cents: i32,
    pub inventory: i32,
    pub image_filename: String,
}

impl From<littlelemon_api_types::MenuItem> for NewMenuItem {
    fn from(value: littlelemon_api_types::MenuItem) -> Self {
        Self {
            title: value.title,
            description: value.description,
            category: value.category,
            price_cents: value.price_cents,
            inventory: value.inventory,
            image_filename: value.image_filename,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::holidays)]
pub struct Holiday {
    pub id: i32,
    pub holiday_date: NaiveDate,
    pub description: String,
}

impl From<Holiday> for littlelemon_api_types::Holiday {
    fn from(value: Holiday) -> Self {
        Self {
            id: value.id,
            holiday_date: value.holiday_date,
            description: value.description,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::holidays)]
pub struct NewHoliday {
    pub holiday_date: NaiveDate,
    pub description: String,
}

impl From<littlelemon_api_types::Holiday> for NewHoliday {
    fn from(value: littlelemon_api_types::Holiday) -> Self {
        Self {
            holiday_date: value.holiday_date,
            description: value.description,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::users)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_manager: bool,
}

impl From<User> for littlelemon_api_types::User {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            phone_number: value.phone_number,
            is_manager: value.is_manager,
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::users)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_manager: bool,
}

impl From<littlelemon_api_types::User> for NewUser {
    fn from(value: littlelemon_api_types::User) -> Self {
        Self {
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            phone_number: value.phone_number.filter(|p| !p.is_empty()),
            is_manager: value.is_manager,
        }
    }
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name=super::schema::users)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some(None)` clears the phone number
    pub phone_number: Option<Option<String>>,
    pub is_manager: Option<bool>,
}

impl From<littlelemon_api_types::UserPatch> for UserPatch {
    fn from(value: littlelemon_api_types::UserPatch) -> Self {
        Self {
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            // An empty string from the client removes the phone number
            phone_number: value
                .phone_number
                .map(|p| if p.is_empty() { None } else { Some(p) }),
            is_manager: value.is_manager,
        }
    }
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.is_manager.is_none()
    }
}

/// Generate a new, time-ordered id for a booking
pub fn new_booking_id() -> BookingId {
    Uuid::now_v7()
}
