use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "mock_mode": state.mock_mode()
    }))
}

pub async fn service_info(state: web::Data<AppState>) -> HttpResponse {
    let docs = if state.config.server.debug {
        "GET /api/health, GET /api/config, POST /api/transcribe, POST /api/polish"
    } else {
        "disabled"
    };

    HttpResponse::Ok().json(json!({
        "name": "Sonote API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": docs
    }))
}
