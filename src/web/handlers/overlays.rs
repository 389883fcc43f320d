use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{info, warn};
use serde_json::Value;

use crate::overlays::{ImageSizeType, IssImageRef, Overlay};
use crate::shell::ShellError;
use crate::web::csrf;
use crate::web::models::{csrf_failure, error_response, GenericResponse, OverlayRequest};
use crate::web::server::AppState;

/// List every overlay in client JSON form, newest first
pub async fn list_overlays(data: web::Data<AppState>) -> impl Responder {
    match data.store.list().await {
        Ok(overlays) => {
            let dicts: Vec<Value> = overlays
                .iter()
                .map(|overlay| Value::Object(overlay.to_json_dict(&data.urls)))
                .collect();
            HttpResponse::Ok().json(dicts)
        }
        Err(e) => error_response(&e),
    }
}

/// Get one overlay
pub async fn get_overlay(data: web::Data<AppState>, path: web::Path<u64>) -> impl Responder {
    match data.store.get(path.into_inner()).await {
        Ok(overlay) => HttpResponse::Ok().json(overlay.to_json_dict(&data.urls)),
        Err(e) => error_response(&e),
    }
}

/// Create an overlay from client JSON
pub async fn create_overlay(
    data: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<OverlayRequest>,
) -> impl Responder {
    if !csrf::verify(&req) {
        warn!("Rejected overlay creation without a valid CSRF token");
        return csrf_failure();
    }

    let fields = &request.fields;
    let name = match fields.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => {
            return error_response(&ShellError::ValidationError("name is required".to_string()));
        }
    };

    let mut overlay = Overlay::new(name, data.public_by_default);
    if let Err(e) = overlay.apply_json_dict(fields) {
        return error_response(&e);
    }

    if let Some(size) = fields.get("imageSize") {
        overlay.extras.insert("imageSize".to_string(), size.clone());
    }

    if let Some(iss_mrf) = fields.get("issMRF").and_then(Value::as_str) {
        let image: IssImageRef = match iss_mrf.parse() {
            Ok(image) => image,
            Err(e) => return error_response(&e),
        };
        if overlay.image_source_url.is_empty() {
            // Without a known size, fetch the full-resolution image
            let size = overlay.image_size_type().unwrap_or(ImageSizeType::Large);
            overlay.image_source_url = image.image_url(size);
        }
        overlay
            .extras
            .insert("infoUrl".to_string(), Value::from(image.info_url()));
        overlay.iss_mrf = Some(image.to_string());
    }

    match data.store.save(overlay).await {
        Ok(overlay) => {
            info!("Created overlay {} ({})", overlay.key, overlay.name);
            HttpResponse::Created().json(overlay.to_json_dict(&data.urls))
        }
        Err(e) => error_response(&e),
    }
}

/// Update an overlay from client JSON
pub async fn update_overlay(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<u64>,
    request: web::Json<OverlayRequest>,
) -> impl Responder {
    if !csrf::verify(&req) {
        warn!("Rejected overlay update without a valid CSRF token");
        return csrf_failure();
    }

    let mut overlay = match data.store.get(path.into_inner()).await {
        Ok(overlay) => overlay,
        Err(e) => return error_response(&e),
    };
    if let Err(e) = overlay.apply_json_dict(&request.fields) {
        return error_response(&e);
    }

    match data.store.save(overlay).await {
        Ok(overlay) => HttpResponse::Ok().json(overlay.to_json_dict(&data.urls)),
        Err(e) => error_response(&e),
    }
}

/// Delete an overlay
pub async fn delete_overlay(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<u64>,
) -> impl Responder {
    if !csrf::verify(&req) {
        warn!("Rejected overlay deletion without a valid CSRF token");
        return csrf_failure();
    }

    let key = path.into_inner();
    match data.store.delete(key).await {
        Ok(()) => {
            info!("Deleted overlay {}", key);
            HttpResponse::Ok().json(GenericResponse {
                success: true,
                message: format!("Overlay {} deleted", key),
                data: None,
            })
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use crate::overlays::MemoryOverlayStore;
    use crate::shell::{AppConfig, TemplateRegistry};
    use crate::web::csrf::{generate_token, token_cookie, CSRF_HEADER_NAME};
    use crate::web::server::{configure, AppState};

    fn state() -> web::Data<AppState> {
        let config = AppConfig::default();
        let client = config.client_config().unwrap();
        web::Data::new(AppState::new(
            &config,
            client,
            TemplateRegistry::new(),
            Arc::new(MemoryOverlayStore::new()),
        ))
    }

    #[actix_web::test]
    async fn test_create_requires_csrf() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/overlays")
            .set_json(json!({"name": "a.jpg"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_update_and_delete_require_csrf() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let token = generate_token();

        let req = test::TestRequest::post()
            .uri("/api/overlays")
            .cookie(token_cookie(&token))
            .insert_header((CSRF_HEADER_NAME, token.clone()))
            .set_json(json!({"name": "guarded.jpg"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let key = created["key"].as_u64().unwrap();

        // Cookie alone is not enough; the header must echo it
        let req = test::TestRequest::put()
            .uri(&format!("/api/overlay/{}", key))
            .cookie(token_cookie(&token))
            .set_json(json!({"name": "renamed.jpg"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/overlay/{}", key))
            .cookie(token_cookie(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/overlay/{}", key))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get().uri(&format!("/api/overlay/{}", key)).to_request();
        let unchanged: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(unchanged["name"], json!("guarded.jpg"));
    }

    #[actix_web::test]
    async fn test_small_iss_image_uses_small_url() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let token = generate_token();

        let req = test::TestRequest::post()
            .uri("/api/overlays")
            .cookie(token_cookie(&token))
            .insert_header((CSRF_HEADER_NAME, token.clone()))
            .set_json(json!({"name": "small.jpg", "issMRF": "ISS039-E-12345", "imageSize": [640, 480]}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["imageSize"], json!([640, 480]));
        assert_eq!(
            created["imageSourceUrl"],
            json!("http://eol.jsc.nasa.gov/DatabaseImages/ESC/small/ISS039/ISS039-E-12345.jpg")
        );
    }

    #[actix_web::test]
    async fn test_overlay_lifecycle() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let token = generate_token();

        let req = test::TestRequest::post()
            .uri("/api/overlays")
            .cookie(token_cookie(&token))
            .insert_header((CSRF_HEADER_NAME, token.clone()))
            .set_json(json!({"name": "Lake Tahoe.png", "issMRF": "ISS039-E-12345", "centerLat": 39.1}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let key = created["key"].as_u64().unwrap();
        assert_eq!(created["name"], json!("Lake Tahoe.png"));
        assert_eq!(created["issMRF"], json!("ISS039-E-12345"));
        assert_eq!(
            created["imageSourceUrl"],
            json!("http://eol.jsc.nasa.gov/DatabaseImages/ESC/large/ISS039/ISS039-E-12345.jpg")
        );
        assert_eq!(created["centerLat"], json!(39.1));
        assert_eq!(
            created["infoUrl"],
            json!("http://eol.jsc.nasa.gov/GeoCam/PhotoInfo.pl?photo=ISS039-E-12345")
        );

        let req = test::TestRequest::put()
            .uri(&format!("/api/overlay/{}", key))
            .cookie(token_cookie(&token))
            .insert_header((CSRF_HEADER_NAME, token.clone()))
            .set_json(json!({"description": "aligned by hand", "points": [[1, 2, 3, 4]]}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["description"], json!("aligned by hand"));
        assert_eq!(updated["points"], json!([[1, 2, 3, 4]]));
        assert_eq!(updated["name"], json!("Lake Tahoe.png"));

        let req = test::TestRequest::get().uri("/api/overlays").to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/overlay/{}", key))
            .cookie(token_cookie(&token))
            .insert_header((CSRF_HEADER_NAME, token.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri(&format!("/api/overlay/{}", key)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_create_validation() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let token = generate_token();

        for body in [json!({"description": "no name"}), json!({"name": "a.jpg", "issMRF": "bogus"})] {
            let req = test::TestRequest::post()
                .uri("/api/overlays")
                .cookie(token_cookie(&token))
                .insert_header((CSRF_HEADER_NAME, token.clone()))
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }
}
