use std::fmt::Display;

mod endpoints_booking;
mod endpoints_branch;
mod endpoints_health;
mod endpoints_holiday;
mod endpoints_menu;
mod endpoints_user;
#[cfg(test)]
mod tests;

use crate::auth_session::SessionToken;
use crate::booking::BookingError;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::BookingStatus;
use crate::data_store::{BookingId, LittleLemonStoreFacade, StoreError};
use actix_web::error::JsonPayloadError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web, HttpResponse,
};
use serde_json::json;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(endpoints_health::health)
        .service(get_api_service());
}

fn get_api_service() -> actix_web::Scope {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| APIError::InvalidQuery(err.to_string()).into());
    // The fixed /bookings/... routes must be registered before /bookings/{booking_id}
    web::scope("/api/v1")
        .app_data(json_config)
        .app_data(query_config)
        .service(endpoints_booking::list_branch_labels)
        .service(endpoints_booking::get_working_hours)
        .service(endpoints_booking::get_availability)
        .service(endpoints_booking::list_bookings)
        .service(endpoints_booking::create_booking)
        .service(endpoints_booking::get_booking)
        .service(endpoints_booking::change_booking)
        .service(endpoints_booking::delete_booking)
        .service(endpoints_branch::list_branches)
        .service(endpoints_branch::create_branch)
        .service(endpoints_branch::get_branch)
        .service(endpoints_branch::update_branch)
        .service(endpoints_branch::delete_branch)
        .service(endpoints_holiday::list_holidays)
        .service(endpoints_holiday::create_holiday)
        .service(endpoints_holiday::get_holiday)
        .service(endpoints_holiday::update_holiday)
        .service(endpoints_holiday::delete_holiday)
        .service(endpoints_menu::list_menu_items)
        .service(endpoints_menu::create_menu_item)
        .service(endpoints_menu::get_menu_item)
        .service(endpoints_menu::update_menu_item)
        .service(endpoints_menu::delete_menu_item)
        .service(endpoints_user::list_users)
        .service(endpoints_user::create_user)
        .service(endpoints_user::get_user)
        .service(endpoints_user::change_user)
        .service(endpoints_user::delete_user)
}

#[derive(Debug)]
pub enum APIError {
    NotExisting,
    AlreadyExisting,
    PermissionDenied {
        required_privilege: Privilege,
    },
    NoSessionToken,
    InvalidSessionToken,
    InvalidJson(actix_web::error::JsonPayloadError),
    /// Missing or malformed URL query parameters
    InvalidQuery(String),
    InvalidData(String),
    EntityIdMissmatch,
    /// The booking request has one or more invalid fields
    ValidationErrors(Vec<littlelemon_api_types::FieldError>),
    /// No free table in the requested time slot. Contains the id of the FAILED booking.
    SlotUnavailable(BookingId),
    PastBooking,
    InvalidStatusChange {
        from: BookingStatus,
        to: BookingStatus,
    },
    ChangeNotPermitted(&'static str),
    /// The availability decision for a new booking failed unexpectedly. The details are only
    /// logged, not sent to the client.
    BookingFailed(String),
    TransactionConflict,
    ConcurrentEditConflict,
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExisting => f.write_str("Element does not exist")?,
            Self::AlreadyExisting => {
                f.write_str("Element already exists")?;
            },
            Self::PermissionDenied{required_privilege} => {
                write!(f, "Client is not authorized to perform this action. Authentication as {} is required.",
                       required_privilege
                           .qualifying_roles()
                           .iter()
                           .map(|role| role.name().to_owned())
                           .collect::<Vec<String>>()
                           .join(" or "))?;
            },
            Self::NoSessionToken => {
                f.write_str("This action requires authentication, but client did not send authentication session token.")?
            },
            Self::InvalidSessionToken => {
                f.write_str("This action requires authentication, but client authentication session given by the client is not valid.")?
            },
            Self::InternalError(s) => {
                f.write_str("Internal error: ")?;
                f.write_str(s)?;
            },
            Self::InvalidJson(e) => {
                write!(f, "Invalid JSON request data: {}", e)?;
            },
            Self::InvalidQuery(e) => {
                write!(f, "Invalid query parameters: {}", e)?;
            },
            Self::InvalidData(e) => {
                write!(f, "Invalid request data: {}", e)?;
            },
            Self::EntityIdMissmatch => {
                f.write_str("Entity id in given data does not match URL")?;
            },
            Self::ValidationErrors(errors) => {
                f.write_str("Invalid booking request: ")?;
                f.write_str(&errors.iter().map(|e| e.code.as_str()).collect::<Vec<_>>().join(", "))?;
            },
            Self::SlotUnavailable(_) => {
                f.write_str("No tables available in the requested time slot. Please choose another time.")?;
            },
            Self::PastBooking => {
                f.write_str("Past bookings cannot be modified or deleted.")?;
            },
            Self::InvalidStatusChange{from, to} => {
                write!(f, "Booking status cannot be changed from {} to {}.", from, to)?;
            },
            Self::ChangeNotPermitted(reason) => {
                f.write_str(reason)?;
            },
            Self::BookingFailed(_) => {
                f.write_str("The booking could not be completed due to an internal error. Please try again later.")?;
            },
            Self::TransactionConflict => {
                f.write_str("Concurrent database transaction conflict. Please retry request.")?;
            },
            Self::ConcurrentEditConflict => {
                f.write_str("Editing entity refused due to a concurrent update of the entity.")?;
            },
        };
        Ok(())
    }
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        let message = format!("{}", self);

        let body = match self {
            Self::ValidationErrors(errors) => json!({
                "httpCode": self.status_code().as_u16(),
                "message": message,
                "errors": errors,
            }),
            Self::SlotUnavailable(booking_id) => json!({
                "httpCode": self.status_code().as_u16(),
                "message": message,
                "booking": booking_id,
            }),
            _ => json!({
                "httpCode": self.status_code().as_u16(),
                "message": message
            }),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting => StatusCode::CONFLICT,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NoSessionToken => StatusCode::FORBIDDEN,
            Self::InvalidSessionToken => StatusCode::FORBIDDEN,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonPayloadError::Deserialize(json_error) if json_error.is_data() => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EntityIdMissmatch => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ValidationErrors(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SlotUnavailable(_) => StatusCode::CONFLICT,
            Self::PastBooking => StatusCode::BAD_REQUEST,
            Self::InvalidStatusChange { .. } => StatusCode::BAD_REQUEST,
            Self::ChangeNotPermitted(_) => StatusCode::FORBIDDEN,
            Self::BookingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConcurrentEditConflict => StatusCode::CONFLICT,
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => {
                Self::InternalError(format!("Could not connect to database: {}", error))
            }
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::NotExisting,
            StoreError::ConflictEntityExists => Self::AlreadyExisting,
            StoreError::ConcurrentEditConflict => Self::ConcurrentEditConflict,
            StoreError::PermissionDenied { required_privilege } => {
                Self::PermissionDenied { required_privilege }
            }
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<BookingError> for APIError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Validation(errors) => {
                Self::ValidationErrors(errors.iter().map(|e| e.into()).collect())
            }
            BookingError::SlotUnavailable(booking) => Self::SlotUnavailable(booking.id),
            BookingError::PastBooking => Self::PastBooking,
            BookingError::InvalidStatusChange { from, to } => {
                Self::InvalidStatusChange { from, to }
            }
            BookingError::ChangeNotPermitted(reason) => Self::ChangeNotPermitted(reason),
            BookingError::SystemFailure(e) => Self::BookingFailed(e.to_string()),
            BookingError::Store(e) => e.into(),
        }
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<crate::auth_session::SessionError> for APIError {
    fn from(_e: crate::auth_session::SessionError) -> Self {
        APIError::InvalidSessionToken
    }
}

/// Get the [AuthToken] for the user of the client's session.
///
/// A session of a user, which does not exist anymore, is treated as invalid session.
fn authenticate(
    store: &mut dyn LittleLemonStoreFacade,
    session_token: &SessionToken,
) -> Result<AuthToken, APIError> {
    store
        .get_auth_token_for_session(session_token)
        .map_err(|e| match e {
            StoreError::NotExisting => APIError::InvalidSessionToken,
            e => e.into(),
        })
}

struct SessionTokenHeader(String);
const SESSION_TOKEN_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(30 * 86400);

impl SessionTokenHeader {
    fn session_token(
        &self,
        secret: &str,
    ) -> Result<crate::auth_session::SessionToken, crate::auth_session::SessionError> {
        SessionToken::from_string(&self.0, secret, SESSION_TOKEN_MAX_AGE)
    }
}

impl actix_web::http::header::TryIntoHeaderValue for SessionTokenHeader {
    type Error = actix_web::http::header::InvalidHeaderValue;

    fn try_into_value(self) -> Result<actix_web::http::header::HeaderValue, Self::Error> {
        self.0.parse()
    }
}

impl actix_web::http::header::Header for SessionTokenHeader {
    fn name() -> actix_web::http::header::HeaderName {
        actix_web::http::header::HeaderName::from_static("x-session-token")
    }

    fn parse<M: actix_web::HttpMessage>(msg: &M) -> Result<Self, actix_web::error::ParseError> {
        Ok(Self(
            msg.headers()
                .get(Self::name())
                .ok_or(actix_web::error::ParseError::Header)?
                .to_str()
                .unwrap_or("")
                .to_owned(),
        ))
    }
}
