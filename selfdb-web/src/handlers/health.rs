//! Dockerflow-style health endpoints, exempt from the Auth Gate (§4.2
//! public allow-list).

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn health_db(state: web::Data<AppState>) -> HttpResponse {
    match state.db.get().await {
        Ok(_) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err(e) => {
            error!("health check could not reach postgres"; "error" => %e);
            HttpResponse::ServiceUnavailable().json(json!({ "status": "error" }))
        }
    }
}
