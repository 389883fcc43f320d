use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shell::error::ShellError;

/// Overlay create/update request; any field the client sends
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct OverlayRequest {
    pub fields: Map<String, Value>,
}

/// Generic response
#[derive(Serialize)]
pub struct GenericResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            error_code: error_code.into(),
        }
    }
}

impl From<&ShellError> for ErrorResponse {
    fn from(err: &ShellError) -> Self {
        Self::new(err.to_string(), err.code())
    }
}

/// Map an error onto its HTTP status with a JSON body
pub fn error_response(err: &ShellError) -> HttpResponse {
    let body = ErrorResponse::from(err);
    match err {
        ShellError::NotFound(_) => HttpResponse::NotFound().json(body),
        ShellError::ValidationError(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

pub fn csrf_failure() -> HttpResponse {
    HttpResponse::Forbidden().json(ErrorResponse::new(
        "CSRF token missing or incorrect",
        "CSRF_FAILED",
    ))
}
