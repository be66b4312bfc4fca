use actix_web::{get, web, Responder};

#[get("/health")]
async fn health() -> impl Responder {
    web::Json(littlelemon_api_types::HealthStatus {
        status: "ok".to_owned(),
    })
}
