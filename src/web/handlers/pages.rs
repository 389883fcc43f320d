use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::error;
use serde_json::Value;

use crate::shell::BootstrapPayload;
use crate::web::csrf;
use crate::web::models::ErrorResponse;
use crate::web::server::AppState;

/// Render the shell, reusing the caller's CSRF token or minting one
fn render_shell(data: &AppState, req: &HttpRequest, overlays: Option<Vec<Value>>) -> HttpResponse {
    let (token, fresh) = match csrf::cookie_token(req) {
        Some(token) => (token, false),
        None => (csrf::generate_token(), true),
    };

    let mut payload = BootstrapPayload::new(&data.client, &data.templates);
    if let Some(overlays) = overlays {
        payload = payload.with_overlays(overlays);
    }

    match data.assembler.render(&payload, &token) {
        Ok(body) => {
            let mut response = HttpResponse::Ok();
            if fresh {
                response.cookie(csrf::token_cookie(&token));
            }
            response.content_type("text/html; charset=utf-8").body(body)
        }
        Err(e) => {
            error!("Page shell rendering error: {}", e);
            HttpResponse::InternalServerError().body(format!("Template error: {}", e))
        }
    }
}

/// Serve the overlay list page, seeded with every stored overlay
pub async fn overlays(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let overlays = match data.store.list().await {
        Ok(overlays) => overlays,
        Err(e) => {
            error!("Failed to load overlays for page: {}", e);
            return HttpResponse::InternalServerError().body(format!("Storage error: {}", e));
        }
    };

    let seed = overlays
        .iter()
        .map(|overlay| Value::Object(overlay.to_json_dict(&data.urls)))
        .collect();

    render_shell(&data, &req, Some(seed))
}

/// Serve the shell for a new overlay; the client collection starts empty
pub async fn new_overlay(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    render_shell(&data, &req, None)
}

/// 404 Not Found handler
pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ErrorResponse::new("Page not found", "NOT_FOUND"))
}
