use crate::booking::validation::is_valid_phone;
use crate::data_store::models::{NewUser, UserPatch};
use crate::data_store::{ListFilter, UserOrderingField};
use crate::web::api::{authenticate, APIError, SessionTokenHeader};
use crate::web::util::ListFilterAsQuery;
use crate::web::AppState;
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};

#[get("/users")]
async fn list_users(
    query: web::Query<ListFilterAsQuery<UserOrderingField>>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let filter = ListFilter::from(query.into_inner());
    let users: Vec<littlelemon_api_types::User> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.get_users(&auth, filter)?)
    })
    .await??
    .into_iter()
    .map(|u| u.into())
    .collect();

    Ok(web::Json(users))
}

#[post("/users")]
async fn create_user(
    data: web::Json<littlelemon_api_types::User>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let user = NewUser::from(data.into_inner());
    check_user_data(Some(&user.email), user.phone_number.as_deref())?;
    let created: littlelemon_api_types::User = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.create_user(&auth, user)?)
    })
    .await??
    .into();

    Ok(HttpResponse::Created().json(created))
}

#[get("/users/{user_id}")]
async fn get_user(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let user_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let user: littlelemon_api_types::User = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.get_user(&auth, user_id)?)
    })
    .await??
    .into();
    Ok(web::Json(user))
}

#[patch("/users/{user_id}")]
async fn change_user(
    path: web::Path<i32>,
    data: web::Json<littlelemon_api_types::UserPatch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let user_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let patch = UserPatch::from(data.into_inner());
    check_user_data(
        patch.email.as_deref(),
        patch.phone_number.as_ref().and_then(|p| p.as_deref()),
    )?;
    let user: littlelemon_api_types::User = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.update_user(&auth, user_id, patch)?)
    })
    .await??
    .into();
    Ok(web::Json(user))
}

#[delete("/users/{user_id}")]
async fn delete_user(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let user_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        store.delete_user(&auth, user_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

fn check_user_data(email: Option<&str>, phone_number: Option<&str>) -> Result<(), APIError> {
    if let Some(email) = email {
        if !email.contains('@') {
            return Err(APIError::InvalidData(
                "Not a valid email address.".to_owned(),
            ));
        }
    }
    if let Some(phone_number) = phone_number {
        if !is_valid_phone(phone_number) {
            return Err(APIError::InvalidData(
                "Phone number must be exactly 10 digits.".to_owned(),
            ));
        }
    }
    Ok(())
}
