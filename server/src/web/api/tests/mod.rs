
use super::*;
use crate::data_store::models;
use crate::data_store::store_mock::StoreMock;
use crate::web::AppState;
use actix_web::{http, test, web, App};
use littlelemon_api_types::{BookingRequest, BookingStatus as ApiBookingStatus};
use sample_data::*;
use std::sync::Arc;

const APP_SECRET: &str = "123456";

fn app_state(store: &Arc<StoreMock>) -> AppState {
    AppState {
        store: store.clone(),
        secret: APP_SECRET.to_string(),
        buffer_tables: 2,
        timezone: chrono_tz::UTC,
    }
}

fn sample_store() -> Arc<StoreMock> {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    store
}

fn session_header(user_id: i32) -> (String, String) {
    (
        "X-SESSION-TOKEN".to_string(),
        SessionToken::new(user_id).as_string(APP_SECRET),
    )
}

fn booking_request(start: &str, end: &str) -> BookingRequest {
    BookingRequest {
        branch: "Chennai".to_owned(),
        name: "Bob".to_owned(),
        phone: "9123456780".to_owned(),
        guest_count: 2,
        booking_date: tomorrow(),
        start_time: time(start),
        end_time: time(end),
        message: "".to_owned(),
    }
}

fn error_codes(body: &serde_json::Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["code"].as_str().unwrap().to_owned())
        .collect()
}

#[actix_web::test]
async fn test_health() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let result: littlelemon_api_types::HealthStatus =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.status, "ok");
}

#[actix_web::test]
async fn test_create_booking_and_duplicate() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(booking_request("11:00", "11:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let booking: littlelemon_api_types::Booking = test::read_body_json(res).await;
    assert_eq!(booking.status, ApiBookingStatus::Booked);
    assert_eq!(booking.user, USER_BOB);
    assert_eq!(booking.branch, "Chennai");

    // The same request again overlaps with the booking just created
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(booking_request("11:00", "11:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(error_codes(&body), vec!["duplicate_request"]);
    assert_eq!(body["errors"][0]["field"], "non_field_errors");

    // Back-to-back is fine
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(booking_request("11:30", "12:00"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);

    assert_eq!(
        store
            .data
            .lock()
            .unwrap()
            .bookings
            .iter()
            .filter(|b| b.user_id == USER_BOB && b.status == models::BookingStatus::Booked)
            .count(),
        3
    );
}

#[actix_web::test]
async fn test_create_booking_validation_errors() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let mut request = booking_request("09:00", "08:30");
    request.phone = "12345".to_owned();
    request.guest_count = 12;
    request.booking_date = today() - chrono::Days::new(1);
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(request)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(res).await;
    let codes = error_codes(&body);
    for code in [
        "invalid_phone",
        "invalid_guest_count",
        "past_date",
        "start_out_of_hours",
        "end_before_start",
    ] {
        assert!(codes.contains(&code.to_owned()), "{} missing in {:?}", code, codes);
    }
    assert_eq!(codes.len(), 5);

    // Branch labels are case-sensitive
    let mut request = booking_request("11:00", "11:30");
    request.branch = "chennai".to_owned();
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(request)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(error_codes(&body), vec!["unknown_branch"]);

    // Nothing has been persisted
    assert_eq!(store.data.lock().unwrap().bookings.len(), 2);
}

#[actix_web::test]
async fn test_create_booking_slot_unavailable() {
    let store = sample_store();
    {
        // Together with Anna's booking, all 3 bookable tables (5 minus 2 buffer) are taken
        let mut data = store.data.lock().unwrap();
        for _ in 0..2 {
            data.bookings.push(models::Booking {
                id: models::new_booking_id(),
                user_id: USER_MANAGER,
                branch_id: BRANCH_CHENNAI,
                name: "Walk-in group".to_owned(),
                phone: "9000000000".to_owned(),
                guest_count: 6,
                booking_date: tomorrow(),
                start_time: time("19:30"),
                end_time: time("21:00"),
                message: "".to_owned(),
                status: models::BookingStatus::Booked,
                created_at: chrono::Utc::now(),
            });
        }
    }
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(booking_request("20:00", "21:00"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);
    let body: serde_json::Value = test::read_body_json(res).await;
    let failed_id: uuid::Uuid = body["booking"].as_str().unwrap().parse().unwrap();
    {
        let data = store.data.lock().unwrap();
        let failed = data.bookings.iter().find(|b| b.id == failed_id).unwrap();
        assert_eq!(failed.status, models::BookingStatus::Failed);
        assert_eq!(failed.user_id, USER_BOB);
    }

    // A slot starting when the others end is still available
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(booking_request("21:00", "21:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
}

#[actix_web::test]
async fn test_create_booking_system_failure() {
    let store = sample_store();
    store.data.lock().unwrap().next_settlement_error =
        Some(StoreError::ConnectionError("connection reset".to_owned()));
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_BOB))
        .set_json(booking_request("11:00", "11:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert!(!body["message"]
        .as_str()
        .unwrap()
        .contains("connection reset"));

    let data = store.data.lock().unwrap();
    let attempt = data
        .bookings
        .iter()
        .find(|b| b.user_id == USER_BOB && b.booking_date == tomorrow())
        .unwrap();
    assert_eq!(attempt.status, models::BookingStatus::Failed);
}

#[actix_web::test]
async fn test_session_token_required() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/bookings").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings")
        .append_header((
            "X-SESSION-TOKEN".to_string(),
            SessionToken::new(USER_ANNA).as_string("other secret"),
        ))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    // Token of a user who does not exist
    let req = test::TestRequest::get()
        .uri("/api/v1/bookings")
        .append_header(session_header(42))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_list_bookings() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings")
        .append_header(session_header(USER_ANNA))
        .to_request();
    let result: Vec<littlelemon_api_types::Booking> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, ANNA_BOOKING);

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings?ordering=-booking_date")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Booking> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        result.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![ANNA_BOOKING, BOB_PAST_BOOKING]
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings?search=BOB%40example")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Booking> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, BOB_PAST_BOOKING);

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings?ordering=phone")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_get_booking_access() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    for (user, expected_status) in [
        (USER_ANNA, http::StatusCode::OK),
        (USER_MANAGER, http::StatusCode::OK),
        (USER_BOB, http::StatusCode::FORBIDDEN),
    ] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/bookings/{}", ANNA_BOOKING))
            .append_header(session_header(user))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), expected_status);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/bookings/{}", models::new_booking_id()))
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_change_booking() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;
    let uri = format!("/api/v1/bookings/{}", ANNA_BOOKING);

    // Only managers may mark bookings as completed
    let req = test::TestRequest::patch()
        .uri(&uri)
        .append_header(session_header(USER_ANNA))
        .set_json(serde_json::json!({"status": "COMPLETED"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    // Managers cannot change the booking details
    let req = test::TestRequest::patch()
        .uri(&uri)
        .append_header(session_header(USER_MANAGER))
        .set_json(serde_json::json!({"name": "Mario"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .append_header(session_header(USER_ANNA))
        .set_json(serde_json::json!({"phone": "98765"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .append_header(session_header(USER_ANNA))
        .set_json(serde_json::json!({"no_of_guests": 6, "message": ""}))
        .to_request();
    let result: littlelemon_api_types::Booking = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.guest_count, 6);
    assert_eq!(result.message, "");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .append_header(session_header(USER_ANNA))
        .set_json(serde_json::json!({"status": "CANCELED"}))
        .to_request();
    let result: littlelemon_api_types::Booking = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.status, ApiBookingStatus::Canceled);

    // Canceled is terminal
    let req = test::TestRequest::patch()
        .uri(&uri)
        .append_header(session_header(USER_MANAGER))
        .set_json(serde_json::json!({"status": "BOOKED"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);

    // Past bookings cannot be modified
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bookings/{}", BOB_PAST_BOOKING))
        .append_header(session_header(USER_BOB))
        .set_json(serde_json::json!({"status": "CANCELED"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_booking() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/bookings/{}", BOB_PAST_BOOKING))
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/bookings/{}", ANNA_BOOKING))
        .append_header(session_header(USER_BOB))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/bookings/{}", ANNA_BOOKING))
        .append_header(session_header(USER_ANNA))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NO_CONTENT);
    assert!(!store
        .data
        .lock()
        .unwrap()
        .bookings
        .iter()
        .any(|b| b.id == ANNA_BOOKING));
}

#[actix_web::test]
async fn test_branch_helpers() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings/branches")
        .append_header(session_header(USER_BOB))
        .to_request();
    let result: littlelemon_api_types::BranchList =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.branches, vec!["Chennai", "Mumbai"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings/working_hours?branch=Chennai")
        .append_header(session_header(USER_BOB))
        .to_request();
    let result: littlelemon_api_types::WorkingHours =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.opening_time, "10:00");
    assert_eq!(result.closing_time, "22:00");

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings/working_hours")
        .append_header(session_header(USER_BOB))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings/working_hours?branch=Delhi")
        .append_header(session_header(USER_BOB))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_availability() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/bookings/availability?branch=Chennai&date={}&start_time=19:30:00&end_time=20:00:00",
            tomorrow()
        ))
        .append_header(session_header(USER_BOB))
        .to_request();
    let result: littlelemon_api_types::SlotAvailability =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.overlapping_bookings, 1);
    assert_eq!(result.capacity, 3);
    assert_eq!(result.available_tables, 2);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/bookings/availability?branch=Chennai&date={}&start_time=20:30:00&end_time=21:00:00",
            tomorrow()
        ))
        .append_header(session_header(USER_BOB))
        .to_request();
    let result: littlelemon_api_types::SlotAvailability =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.overlapping_bookings, 0);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/bookings/availability?branch=Chennai&date={}&start_time=20:00:00&end_time=19:00:00",
            tomorrow()
        ))
        .append_header(session_header(USER_BOB))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_manage_branches() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/restaurants")
        .append_header(session_header(USER_ANNA))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/restaurants")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Branch> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 2);

    let mut new_branch = result[0].clone();
    new_branch.id = 0;
    new_branch.branch = "Delhi".to_owned();
    new_branch.opening_time = time("23:00");
    let req = test::TestRequest::post()
        .uri("/api/v1/restaurants")
        .append_header(session_header(USER_MANAGER))
        .set_json(new_branch.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    new_branch.opening_time = time("09:00");
    let req = test::TestRequest::post()
        .uri("/api/v1/restaurants")
        .append_header(session_header(USER_MANAGER))
        .set_json(new_branch.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let created: littlelemon_api_types::Branch = test::read_body_json(res).await;
    assert_eq!(created.branch, "Delhi");

    // Label must be unique
    let req = test::TestRequest::post()
        .uri("/api/v1/restaurants")
        .append_header(session_header(USER_MANAGER))
        .set_json(new_branch.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/restaurants/{}", BRANCH_CHENNAI))
        .append_header(session_header(USER_MANAGER))
        .set_json(created.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let mut changed = created.clone();
    changed.table_count = 8;
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/restaurants/{}", created.id))
        .append_header(session_header(USER_MANAGER))
        .set_json(changed)
        .to_request();
    let result: littlelemon_api_types::Branch = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.table_count, 8);

    // Chennai still has bookings
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/restaurants/{}", BRANCH_CHENNAI))
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/restaurants/{}", created.id))
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_menu() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/menu").to_request();
    let result: Vec<littlelemon_api_types::MenuItem> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 3);

    let req = test::TestRequest::get()
        .uri("/api/v1/menu?search=starters")
        .to_request();
    let result: Vec<littlelemon_api_types::MenuItem> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 2);

    let new_item = serde_json::json!({"title": "Lemon Cake", "priceCents": 550});
    let req = test::TestRequest::post()
        .uri("/api/v1/menu")
        .append_header(session_header(USER_ANNA))
        .set_json(new_item.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/menu")
        .append_header(session_header(USER_MANAGER))
        .set_json(new_item)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let created: littlelemon_api_types::MenuItem = test::read_body_json(res).await;
    assert_eq!(created.category, "None");
    assert_eq!(created.image_filename, "/static/img/menu/boil.png");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/menu/{}", created.id))
        .to_request();
    let result: littlelemon_api_types::MenuItem = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.title, "Lemon Cake");

    let req = test::TestRequest::get().uri("/api/v1/menu/99").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_holidays() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/holidays")
        .append_header(session_header(USER_ANNA))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/holidays")
        .append_header(session_header(USER_MANAGER))
        .set_json(serde_json::json!({"holiday_date": "2025-08-15", "description": "Independence Day"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/v1/holidays")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Holiday> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 2);
}

#[actix_web::test]
async fn test_users() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/users")
        .append_header(session_header(USER_ANNA))
        .to_request();
    let result: Vec<littlelemon_api_types::User> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].email, "anna@example.com");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/users/{}", USER_BOB))
        .append_header(session_header(USER_ANNA))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/users/{}", USER_ANNA))
        .append_header(session_header(USER_ANNA))
        .set_json(serde_json::json!({"isManager": true}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/users/{}", USER_ANNA))
        .append_header(session_header(USER_ANNA))
        .set_json(serde_json::json!({"last_name": "Smith", "phone_number": "9876543210"}))
        .to_request();
    let result: littlelemon_api_types::User = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.last_name, "Smith");
    assert_eq!(result.phone_number.as_deref(), Some("9876543210"));

    let new_user = serde_json::json!({"email": "carla@example.com", "first_name": "Carla"});
    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .append_header(session_header(USER_ANNA))
        .set_json(new_user.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .append_header(session_header(USER_MANAGER))
        .set_json(new_user)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/v1/users")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::User> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 4);
}

#[actix_web::test]
async fn test_list_search_and_ordering() {
    let store = sample_store();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(&store))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/menu?ordering=-price")
        .to_request();
    let result: Vec<littlelemon_api_types::MenuItem> =
        test::call_and_read_body_json(&app, req).await;
    let titles: Vec<&str> = result.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Greek Salad", "Bruschetta", "Lemon Dessert"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/menu?search=starters&ordering=title")
        .to_request();
    let result: Vec<littlelemon_api_types::MenuItem> =
        test::call_and_read_body_json(&app, req).await;
    let titles: Vec<&str> = result.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Bruschetta", "Greek Salad"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/menu?ordering=calories")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/users?search=example.com&ordering=-first_name")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::User> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = result.iter().map(|u| u.first_name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Anna"]);

    // Search does not widen the user's own scope
    let req = test::TestRequest::get()
        .uri("/api/v1/users?search=bob")
        .append_header(session_header(USER_ANNA))
        .to_request();
    let result: Vec<littlelemon_api_types::User> = test::call_and_read_body_json(&app, req).await;
    assert!(result.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/v1/restaurants?ordering=-branch")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Branch> =
        test::call_and_read_body_json(&app, req).await;
    let labels: Vec<&str> = result.iter().map(|b| b.branch.as_str()).collect();
    assert_eq!(labels, vec!["Mumbai", "Chennai"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/restaurants?search=044")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Branch> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].branch, "Chennai");

    let req = test::TestRequest::post()
        .uri("/api/v1/holidays")
        .append_header(session_header(USER_MANAGER))
        .set_json(serde_json::json!({"holiday_date": "2025-08-15", "description": "Independence Day"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/v1/holidays?ordering=-holiday_date")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Holiday> =
        test::call_and_read_body_json(&app, req).await;
    let descriptions: Vec<&str> = result.iter().map(|h| h.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Independence Day", "Republic Day"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/holidays?search=2025-01-26")
        .append_header(session_header(USER_MANAGER))
        .to_request();
    let result: Vec<littlelemon_api_types::Holiday> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].description, "Republic Day");
}
