use crate::booking::validation::is_valid_phone;
use crate::data_store::models::NewBranch;
use crate::data_store::{BranchOrderingField, ListFilter};
use crate::web::api::{authenticate, APIError, SessionTokenHeader};
use crate::web::util::ListFilterAsQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/restaurants")]
async fn list_branches(
    query: web::Query<ListFilterAsQuery<BranchOrderingField>>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let filter = ListFilter::from(query.into_inner());
    let branches: Vec<littlelemon_api_types::Branch> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let auth = authenticate(&mut *store, &session_token)?;
            Ok(store.get_branches(&auth, filter)?)
        })
        .await??
        .into_iter()
        .map(|b| b.into())
        .collect();

    Ok(web::Json(branches))
}

#[post("/restaurants")]
async fn create_branch(
    data: web::Json<littlelemon_api_types::Branch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let branch = data.into_inner();
    check_branch_data(&branch)?;
    let created: littlelemon_api_types::Branch = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.create_branch(&auth, NewBranch::from(branch))?)
    })
    .await??
    .into();

    Ok(HttpResponse::Created().json(created))
}

#[get("/restaurants/{branch_id}")]
async fn get_branch(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let branch_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let branch: littlelemon_api_types::Branch = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.get_branch(&auth, branch_id)?)
    })
    .await??
    .into();
    Ok(web::Json(branch))
}

#[put("/restaurants/{branch_id}")]
async fn update_branch(
    path: web::Path<i32>,
    data: web::Json<littlelemon_api_types::Branch>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let branch_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let branch = data.into_inner();
    // The id may be omitted in the request body
    if branch.id != 0 && branch.id != branch_id {
        return Err(APIError::EntityIdMissmatch);
    }
    check_branch_data(&branch)?;
    let updated: littlelemon_api_types::Branch = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.update_branch(&auth, branch_id, NewBranch::from(branch))?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/restaurants/{branch_id}")]
async fn delete_branch(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let branch_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        store.delete_branch(&auth, branch_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

/// Check the constraints of a branch, which are also enforced by the database, to give a useful
/// error message.
fn check_branch_data(branch: &littlelemon_api_types::Branch) -> Result<(), APIError> {
    if branch.branch.trim().is_empty() {
        return Err(APIError::InvalidData(
            "Branch label must not be empty.".to_owned(),
        ));
    }
    if branch.opening_time >= branch.closing_time {
        return Err(APIError::InvalidData(
            "Opening time must be earlier than closing time.".to_owned(),
        ));
    }
    if branch.table_count < 0 {
        return Err(APIError::InvalidData(
            "Number of tables must not be negative.".to_owned(),
        ));
    }
    if !is_valid_phone(&branch.phone) {
        return Err(APIError::InvalidData(
            "Phone number must be exactly 10 digits.".to_owned(),
        ));
    }
    Ok(())
}
