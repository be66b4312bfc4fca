use crate::data_store::models::NewMenuItem;
use crate::data_store::{ListFilter, MenuItemOrderingField};
use crate::web::api::{authenticate, APIError, SessionTokenHeader};
use crate::web::util::ListFilterAsQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

/// The menu is public, so this endpoint does not require a session token
#[get("/menu")]
async fn list_menu_items(
    query: web::Query<ListFilterAsQuery<MenuItemOrderingField>>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let filter = ListFilter::from(query.into_inner());
    let menu_items: Vec<littlelemon_api_types::MenuItem> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            Ok(store.get_menu_items(filter)?)
        })
        .await??
        .into_iter()
        .map(|m| m.into())
        .collect();

    Ok(web::Json(menu_items))
}

#[post("/menu")]
async fn create_menu_item(
    data: web::Json<littlelemon_api_types::MenuItem>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let menu_item = data.into_inner();
    check_menu_item_data(&menu_item)?;
    let created: littlelemon_api_types::MenuItem = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.create_menu_item(&auth, NewMenuItem::from(menu_item))?)
    })
    .await??
    .into();

    Ok(HttpResponse::Created().json(created))
}

#[get("/menu/{menu_item_id}")]
async fn get_menu_item(
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let menu_item_id = path.into_inner();
    let menu_item: littlelemon_api_types::MenuItem = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_menu_item(menu_item_id)?)
    })
    .await??
    .into();
    Ok(web::Json(menu_item))
}

#[put("/menu/{menu_item_id}")]
async fn update_menu_item(
    path: web::Path<i32>,
    data: web::Json<littlelemon_api_types::MenuItem>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let menu_item_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let menu_item = data.into_inner();
    if menu_item.id != 0 && menu_item.id != menu_item_id {
        return Err(APIError::EntityIdMissmatch);
    }
    check_menu_item_data(&menu_item)?;
    let updated: littlelemon_api_types::MenuItem = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        Ok(store.update_menu_item(&auth, menu_item_id, NewMenuItem::from(menu_item))?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/menu/{menu_item_id}")]
async fn delete_menu_item(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let menu_item_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = authenticate(&mut *store, &session_token)?;
        store.delete_menu_item(&auth, menu_item_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

fn check_menu_item_data(menu_item: &littlelemon_api_types::MenuItem) -> Result<(), APIError> {
    if menu_item.title.trim().is_empty() {
        return Err(APIError::InvalidData("Title must not be empty.".to_owned()));
    }
    if menu_item.price_cents < 0 {
        return Err(APIError::InvalidData("Price must not be negative.".to_owned()));
    }
    if menu_item.inventory < 0 {
        return Err(APIError::InvalidData(
            "Inventory must not be negative.".to_owned(),
        ));
    }
    Ok(())
}
