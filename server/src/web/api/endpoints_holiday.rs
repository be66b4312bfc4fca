use crate::data_store::models::NewHoliday;
use crate::data_store::{HolidayOrderingField, ListFilter};
use crate::web::api::{authenticate, APIError, SessionTokenHeader};
use crate::web::util::ListFilterAsQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/holidays")]
async fn list_holidays(
    query: web::Query<ListFilterAsQuery<HolidayOrderingField>>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let filter = ListFilter::from(query.into_inner());
    let holidays: Vec<littlelemon_api_types::Holiday> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let auth = authenticate(&mut *store, &session_token)?;
            Ok(store.get_holidays(&auth, filter)?)
        })
        .await??
        .into_iter()
        .map(|h| h.into())
        .collect();

    Ok(web::Json(holidays))
}

#[post("/holidays")]
async fn create_holiday(
    data: web::Json<littlelemon_api_types::Holiday>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let holiday = data.into_inner();
    let created: littlelemon_api_types::Holiday = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.create_holiday(&auth, NewHoliday::from(holiday))?)
    })
    .await??
    .into();

    Ok(HttpResponse::Created().json(created))
}

#[get("/holidays/{holiday_id}")]
async fn get_holiday(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let holiday_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let holiday: littlelemon_api_types::Holiday = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.get_holiday(&auth, holiday_id)?)
    })
    .await??
    .into();
    Ok(web::Json(holiday))
}

#[put("/holidays/{holiday_id}")]
async fn update_holiday(
    path: web::Path<i32>,
    data: web::Json<littlelemon_api_types::Holiday>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let holiday_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let holiday = data.into_inner();
    if holiday.id != 0 && holiday.id != holiday_id {
        return Err(APIError::EntityIdMissmatch);
    }
    let updated: littlelemon_api_types::Holiday = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.update_holiday(&auth, holiday_id, NewHoliday::from(holiday))?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/holidays/{holiday_id}")]
async fn delete_holiday(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let holiday_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        store.delete_holiday(&auth, holiday_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}
