use crate::booking;
use crate::data_store::auth_token::Privilege;
use crate::data_store::BookingFilter;
use crate::web::api::{authenticate, APIError, SessionTokenHeader};
use crate::web::util::{BookingFilterAsQuery, BranchQuery};
use crate::web::AppState;
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

#[get("/bookings")]
async fn list_bookings(
    query: web::Query<BookingFilterAsQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let bookings: Vec<littlelemon_api_types::Booking> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let auth = authenticate(&mut *store, &session_token)?;
            let mut filter: BookingFilter = query.into_inner().into();
            // Regular users only see their own bookings
            if !auth.has_privilege(Privilege::ManageAllBookings) {
                filter.user = auth.user_id();
            }
            Ok(store.get_bookings_filtered(&auth, filter)?)
        })
        .await??
        .into_iter()
        .map(|b| b.into())
        .collect();

    Ok(web::Json(bookings))
}

#[post("/bookings")]
async fn create_booking(
    data: web::Json<littlelemon_api_types::BookingRequest>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let today = state.today();
    let booking: littlelemon_api_types::Booking = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        let candidate =
            booking::validate_booking_request(&mut *store, &auth, data.into_inner(), today)?;
        let booking =
            booking::check_and_reserve(&mut *store, &auth, candidate, state.buffer_tables)?;
        Ok(store.get_booking(&auth, booking.id)?)
    })
    .await??
    .into();

    Ok(HttpResponse::Created().json(booking))
}

#[get("/bookings/{booking_id}")]
async fn get_booking(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let booking_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let booking: littlelemon_api_types::Booking = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.get_booking(&auth, booking_id)?)
    })
    .await??
    .into();
    Ok(web::Json(booking))
}

#[patch("/bookings/{booking_id}")]
async fn change_booking(
    path: web::Path<Uuid>,
    data: web::Json<littlelemon_api_types::BookingPatch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let booking_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let today = state.today();
    let booking: littlelemon_api_types::Booking = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(booking::lifecycle::update_booking(
            &mut *store,
            &auth,
            booking_id,
            data.into_inner().into(),
            today,
        )?)
    })
    .await??
    .into();
    Ok(web::Json(booking))
}

#[delete("/bookings/{booking_id}")]
async fn delete_booking(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let booking_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let today = state.today();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        booking::lifecycle::delete_booking(&mut *store, &auth, booking_id, today)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

#[get("/bookings/branches")]
async fn list_branch_labels(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let branches = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.list_branch_labels(&auth)?)
    })
    .await??;

    Ok(web::Json(littlelemon_api_types::BranchList { branches }))
}

#[get("/bookings/working_hours")]
async fn get_working_hours(
    query: web::Query<BranchQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let label = query
        .into_inner()
        .branch
        .filter(|b| !b.is_empty())
        .ok_or_else(|| APIError::InvalidQuery("Parameter 'branch' is required.".to_owned()))?;
    let branch = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.get_branch_by_label(&auth, &label)?)
    })
    .await??;

    Ok(web::Json(littlelemon_api_types::WorkingHours {
        opening_time: branch.opening_time.format("%H:%M").to_string(),
        closing_time: branch.closing_time.format("%H:%M").to_string(),
    }))
}

#[derive(Deserialize, Debug)]
struct AvailabilityQuery {
    branch: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

/// Preview of the availability decision for a time slot, without reserving anything
#[get("/bookings/availability")]
async fn get_availability(
    query: web::Query<AvailabilityQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let query = query.into_inner();
    if query.end_time <= query.start_time {
        return Err(APIError::InvalidQuery(
            "end_time must be later than start_time.".to_owned(),
        ));
    }
    let AvailabilityQuery {
        branch: label,
        date,
        start_time,
        end_time,
    } = query;
    let buffer_tables = state.buffer_tables;
    let (branch, overlapping) = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        let branch = store.get_branch_by_label(&auth, &label)?;
        let overlapping =
            store.count_overlapping_booked(&auth, branch.id, date, start_time, end_time)?;
        Ok((branch, overlapping))
    })
    .await??;

    let capacity = booking::capacity(branch.table_count, buffer_tables);
    Ok(web::Json(littlelemon_api_types::SlotAvailability {
        branch: branch.branch,
        booking_date: date,
        start_time,
        end_time,
        overlapping_bookings: overlapping,
        capacity,
        available_tables: (capacity - overlapping).max(0),
    }))
}
