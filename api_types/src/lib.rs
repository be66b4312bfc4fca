use chrono::{naive::NaiveDate, DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_guest_count() -> i32 {
    1
}

fn default_menu_category() -> String {
    "None".to_owned()
}

fn default_image_filename() -> String {
    "/static/img/menu/boil.png".to_owned()
}

fn default_restaurant_name() -> String {
    "Little Lemon Restaurant".to_owned()
}

/// One physical restaurant location
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Branch {
    #[serde(default)]
    pub id: i32,
    #[serde(default = "default_restaurant_name")]
    pub name: String,
    /// The unique label of the branch, used by clients to reference it in booking requests
    pub branch: String,
    #[serde(default)]
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    #[serde(rename = "no_of_tables")]
    pub table_count: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Booked,
    Failed,
    Canceled,
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub user: i32,
    pub branch: String,
    pub name: String,
    pub phone: String,
    #[serde(rename = "no_of_guests")]
    pub guest_count: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub message: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a new booking. The requesting user is taken from the session.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BookingRequest {
    pub branch: String,
    pub name: String,
    pub phone: String,
    #[serde(default = "default_guest_count", rename = "no_of_guests")]
    pub guest_count: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub message: String,
}

/// Partial update of an existing booking. Date, times and branch cannot be changed; re-booking
/// requires a new booking.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "no_of_guests"
    )]
    pub guest_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
}

/// A single problem with a field of a booking request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BranchList {
    pub branches: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkingHours {
    pub opening_time: String,
    pub closing_time: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SlotAvailability {
    pub branch: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(rename = "overlappingBookings")]
    pub overlapping_bookings: i64,
    pub capacity: i64,
    #[serde(rename = "availableTables")]
    pub available_tables: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MenuItem {
    #[serde(default)]
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_menu_category")]
    pub category: String,
    #[serde(default, rename = "priceCents")]
    pub price_cents: i32,
    #[serde(default)]
    pub inventory: i32,
    #[serde(default = "default_image_filename")]
    pub image_filename: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Holiday {
    #[serde(default)]
    pub id: i32,
    pub holiday_date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(default)]
    pub id: i32,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, rename = "isManager")]
    pub is_manager: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "isManager")]
    pub is_manager: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthStatus {
    pub status: String,
}
