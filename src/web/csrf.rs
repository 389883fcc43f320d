use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const CSRF_COOKIE_NAME: &str = "csrftoken";
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

const TOKEN_LENGTH: usize = 32;

/// Fresh random token
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Token from the request cookie, if present and well formed
pub fn cookie_token(req: &HttpRequest) -> Option<String> {
    req.cookie(CSRF_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| is_well_formed(token))
}

pub fn token_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(CSRF_COOKIE_NAME, token.to_string())
        .path("/")
        .same_site(SameSite::Lax)
        .finish()
}

/// A mutating request must echo the cookie token in the CSRF header
pub fn verify(req: &HttpRequest) -> bool {
    let cookie = match cookie_token(req) {
        Some(token) => token,
        None => return false,
    };
    req.headers()
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |header| header == cookie)
}
