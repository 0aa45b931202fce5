use actix_web::{HttpResponse, Responder};
use serde::Serialize;

#[derive(Serialize)]
struct WelcomeResponse {
    message: String,
}

/// Root endpoint, useful as a liveness probe.
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(WelcomeResponse {
        message: "Welcome to Odoo API Connector".to_string(),
    })
}
